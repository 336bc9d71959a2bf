use pacer_lib::task::{Task, TaskEdit};

use super::{process_handler::kill::terminate_execution, Engine, CANCELLED_BY_USER};
use crate::internal_prelude::*;

/// Adding, editing and removing task definitions.
///
/// Every mutation is persisted and published right away.
impl Engine {
    /// Add a new task.
    ///
    /// Input is never rejected, but normalized.
    /// Whitespace is trimmed and negative intervals are treated as `0`.
    pub fn add(&self, name: &str, command: &str, interval: i64) -> Task {
        self.add_task(Task::new(name, command, interval))
    }

    /// Add a new task with a full definition.
    pub fn add_with(&self, edit: TaskEdit) -> Task {
        let mut task = Task::new(&edit.name, &edit.command, edit.interval);
        task.apply_edit(edit);
        self.add_task(task)
    }

    fn add_task(&self, task: Task) -> Task {
        let mut state = self.inner.lock_state();
        let task_id = state.add_task(task);
        info!("Added task {task_id}");
        self.inner.save_and_publish(&mut state);

        state.tasks[&task_id].clone()
    }

    /// Create a copy of an existing task.
    ///
    /// The copy gets a new id and a fresh run state.
    pub fn duplicate(&self, task_id: usize) -> Option<Task> {
        let mut state = self.inner.lock_state();
        let copy = Task::from_task(state.tasks.get(&task_id)?);
        let new_id = state.add_task(copy);
        info!("Duplicated task {task_id} as task {new_id}");
        self.inner.save_and_publish(&mut state);

        state.tasks.get(&new_id).cloned()
    }

    /// Replace the definition of a task.
    ///
    /// A running execution isn't affected and keeps using the old definition.
    /// Returns `false` if the task doesn't exist.
    pub fn update(&self, task_id: usize, edit: TaskEdit) -> bool {
        let mut state = self.inner.lock_state();
        let Some(task) = state.tasks.get_mut(&task_id) else {
            return false;
        };

        task.apply_edit(edit);
        debug!("Updated task {task_id}");
        self.inner.save_and_publish(&mut state);

        true
    }

    /// Enable or disable a task.
    ///
    /// Disabled tasks can neither be started manually nor by the scheduler.
    /// An already running execution finishes normally.
    pub fn set_enabled(&self, task_id: usize, enabled: bool) -> bool {
        let mut state = self.inner.lock_state();
        let Some(task) = state.tasks.get_mut(&task_id) else {
            return false;
        };

        task.enabled = enabled;
        info!(
            "{} task {task_id}",
            if enabled { "Enabled" } else { "Disabled" }
        );
        self.inner.save_and_publish(&mut state);

        true
    }

    /// Remove a task.
    ///
    /// Any in-flight execution of the task is cancelled first.
    pub fn remove(&self, task_id: usize) -> bool {
        if self.inner.lock_state().executions.contains(task_id) {
            self.abort_execution(task_id, CANCELLED_BY_USER);
        }

        let mut state = self.inner.lock_state();
        // The task might have been started again in between.
        if let Some(execution) = state.executions.remove(task_id) {
            terminate_execution(task_id, execution);
        }

        if state.tasks.remove(&task_id).is_none() {
            return false;
        }

        info!("Removed task {task_id}");
        self.inner.save_and_publish(&mut state);

        true
    }

    pub fn get(&self, task_id: usize) -> Option<Task> {
        self.inner.lock_state().tasks.get(&task_id).cloned()
    }

    /// All tasks, ordered by id.
    pub fn list(&self) -> Vec<Task> {
        self.inner.lock_state().task_list()
    }
}
