use std::collections::BTreeMap;

use pacer_lib::task::Task;
use tokio_util::sync::CancellationToken;

use super::executions::{Execution, Executions};

/// This is the full in-memory representation of the engine's state.
///
/// The task map and the active-executions table live side by side behind the same mutex.
/// That way, status transitions and the registration of executions always happen atomically.
#[derive(Debug)]
pub struct InternalState {
    pub tasks: BTreeMap<usize, Task>,
    /// The id the next added task will get. Ids are never reused.
    pub next_id: usize,
    pub executions: Executions,
    /// Incremented for every published snapshot.
    pub revision: u64,
    next_generation: u64,
}

impl Default for InternalState {
    fn default() -> Self {
        InternalState {
            tasks: BTreeMap::new(),
            next_id: 1,
            executions: Executions::default(),
            revision: 0,
            next_generation: 1,
        }
    }
}

impl InternalState {
    /// Create the state from previously persisted tasks.
    pub fn from_tasks(tasks: Vec<Task>) -> InternalState {
        let mut state = InternalState::default();
        for task in tasks {
            state.next_id = state.next_id.max(task.id + 1);
            state.tasks.insert(task.id, task);
        }

        state
    }

    /// Add a new task and assign it the next free id.
    pub fn add_task(&mut self, mut task: Task) -> usize {
        let id = self.next_id;
        self.next_id += 1;

        task.id = id;
        self.tasks.insert(id, task);

        id
    }

    /// Register a new execution for a task and return its generation.
    pub fn register_execution(&mut self, task_id: usize, token: CancellationToken) -> u64 {
        let generation = self.next_generation;
        self.next_generation += 1;

        self.executions.insert(
            task_id,
            Execution {
                generation,
                token,
                pid: None,
            },
        );

        generation
    }

    /// All tasks, ordered by id.
    pub fn task_list(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }
}
