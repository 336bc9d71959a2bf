use std::time::Duration;

use chrono::Local;
use command_group::AsyncGroupChild;
use pacer_lib::task::TaskStatus;

use crate::{
    engine::{internal_state::executions::Execution, Engine, CANCELLED_BY_USER},
    internal_prelude::*,
    process_helper::{kill_child, kill_process_tree, terminate_process_tree},
};

impl Engine {
    /// Cancel the in-flight execution of a task.
    ///
    /// The task goes back to `Pending`.
    /// Returns `false` if the task has no active execution.
    pub fn cancel(&self, task_id: usize) -> bool {
        self.abort_execution(task_id, CANCELLED_BY_USER)
    }

    /// Remove an execution from the table, stop its process tree and reset the task.
    pub(crate) fn abort_execution(&self, task_id: usize, reason: &str) -> bool {
        let mut state = self.inner.lock_state();
        let Some(execution) = state.executions.remove(task_id) else {
            debug!("Task {task_id} has no active execution to cancel");
            return false;
        };

        terminate_execution(task_id, execution);

        if let Some(task) = state.tasks.get_mut(&task_id) {
            task.status = TaskStatus::Pending;
            task.last_error = reason.to_string();
            task.last_run_at = Some(Local::now());
        }
        info!("Cancelled task {task_id}: {reason}");

        self.inner.save_and_publish(&mut state);

        true
    }
}

/// Kill the process tree of an execution and then notify its supervisor.
///
/// The supervisor takes care of escalating to a forceful kill and of reaping the process.
pub(crate) fn terminate_execution(task_id: usize, execution: Execution) {
    if let Some(pid) = execution.pid {
        if let Err(error) = terminate_process_tree(pid) {
            warn!("Failed to terminate process tree of task {task_id}: {error}");
        }
    }

    execution.token.cancel();
}

/// Stop a child process group.
///
/// The group gets a chance to shut down gracefully for the duration of `grace`.
/// Afterwards, the group is forcefully killed.
pub(crate) async fn stop_child(task_id: usize, child: &mut AsyncGroupChild, grace: Duration) {
    if let Some(pid) = child.id() {
        if let Err(error) = terminate_process_tree(pid) {
            warn!("Failed to terminate process tree of task {task_id}: {error}");
        }
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(Ok(_)) => return,
        Ok(Err(error)) => warn!("Failed to wait for task {task_id}: {error}"),
        Err(_) => info!("Task {task_id} is still alive after {grace:?}, killing it"),
    }

    force_kill(task_id, child).await;
}

/// Forcefully kill a child process group and reap it.
///
/// Should the group handle fail, the process tree is killed by its pid instead.
pub(crate) async fn force_kill(task_id: usize, child: &mut AsyncGroupChild) {
    let pid = child.id();
    let Err(error) = kill_child(task_id, child).await else {
        return;
    };
    warn!("Failed to kill process group of task {task_id}: {error}");

    let Some(pid) = pid else {
        return;
    };
    if let Err(error) = kill_process_tree(pid) {
        error!("Failed to kill process tree of task {task_id}: {error}");
    }
}
