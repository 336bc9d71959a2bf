use std::collections::BTreeMap;

use tokio_util::sync::CancellationToken;

/// Runtime bookkeeping of a single in-flight execution.
#[derive(Debug)]
pub struct Execution {
    /// Unique per execution. Used to tell an old, finishing execution apart from a new one
    /// of the same task.
    pub generation: u64,
    pub token: CancellationToken,
    /// The pid of the spawned process group leader.
    /// `None` until the process has been spawned.
    pub pid: Option<u32>,
}

/// A newtype struct around the active-executions table, which is keyed by task id.
///
/// A task has an in-flight execution as long as it has an entry in this table.
#[derive(Debug, Default)]
pub struct Executions(pub BTreeMap<usize, Execution>);

impl Executions {
    pub fn contains(&self, task_id: usize) -> bool {
        self.0.contains_key(&task_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn task_ids(&self) -> Vec<usize> {
        self.0.keys().cloned().collect()
    }

    /// Whether the given execution is still the one registered for its task.
    pub fn is_current(&self, task_id: usize, generation: u64) -> bool {
        self.0
            .get(&task_id)
            .is_some_and(|execution| execution.generation == generation)
    }

    pub fn insert(&mut self, task_id: usize, execution: Execution) {
        self.0.insert(task_id, execution);
    }

    pub fn remove(&mut self, task_id: usize) -> Option<Execution> {
        self.0.remove(&task_id)
    }

    /// Remove the execution of a task, but only if it's still the given one.
    pub fn remove_if_current(&mut self, task_id: usize, generation: u64) -> Option<Execution> {
        if self.is_current(task_id, generation) {
            return self.0.remove(&task_id);
        }

        None
    }

    /// Remember the pid of a freshly spawned process.
    /// Returns `false` if the execution has been removed in the meantime.
    pub fn set_pid(&mut self, task_id: usize, generation: u64, pid: u32) -> bool {
        match self.0.get_mut(&task_id) {
            Some(execution) if execution.generation == generation => {
                execution.pid = Some(pid);
                true
            }
            _ => false,
        }
    }
}
