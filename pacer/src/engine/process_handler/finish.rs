use std::process::ExitStatus;

use chrono::Local;
use pacer_lib::{log::write_execution_log, task::TaskStatus};

use super::ExecutionEnd;
use crate::{engine::Engine, internal_prelude::*};

impl Engine {
    /// Record the result of a finished execution.
    ///
    /// If the execution has been cancelled in the meantime, the task has already been updated
    /// by the cancellation. In that case, only the execution log is written.
    pub(crate) fn finish(&self, task_id: usize, generation: u64, result: Result<ExecutionEnd>) {
        let mut state = self.inner.lock_state();
        let is_current = state
            .executions
            .remove_if_current(task_id, generation)
            .is_some();
        // The task has been cancelled and already started again.
        let superseded = state.executions.contains(task_id);

        let Some(task) = state.tasks.get_mut(&task_id) else {
            debug!("Task {task_id} has been removed while it was running");
            return;
        };

        if is_current {
            task.last_run_at = Some(Local::now());
            if task.is_running() {
                match &result {
                    Ok(ExecutionEnd::Exited(status)) if status.success() => {
                        task.status = TaskStatus::Finished;
                    }
                    Ok(ExecutionEnd::Exited(status)) => {
                        task.status = TaskStatus::Failed;
                        task.last_error = exit_message(status);
                    }
                    Ok(ExecutionEnd::Aborted) => {
                        task.status = TaskStatus::Failed;
                        task.last_error = "Execution aborted".into();
                    }
                    Err(error) => {
                        task.status = TaskStatus::Failed;
                        task.last_error = error_message(error);
                    }
                }
            }
            info!("Task {task_id} finished with status {}", task.status);
        } else if let Err(error) = &result {
            warn!("Cancelled execution of task {task_id} failed: {error:?}");
        }

        if !superseded {
            let log_directory = self.inner.settings.shared.log_directory();
            if let Err(error) = write_execution_log(task, &log_directory) {
                warn!("Failed to write execution log of task {task_id}: {error}");
            }
        }

        if is_current {
            self.inner.save_and_publish(&mut state);
        }
    }
}

fn exit_message(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("Exit code: {code}");
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("Killed by signal {signal}");
        }
    }

    "Process terminated without exit code".into()
}

/// Flatten an error and all its causes into a single line.
fn error_message(error: &color_eyre::Report) -> String {
    error
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
