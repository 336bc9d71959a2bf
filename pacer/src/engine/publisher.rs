use std::sync::Arc;

use pacer_lib::task::Task;
use tokio::sync::watch;

use super::internal_state::state::InternalState;

/// An immutable, point-in-time view of all tasks, ordered by id.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    /// Strictly increasing with every published change.
    pub revision: u64,
    pub tasks: Arc<Vec<Task>>,
}

impl Snapshot {
    pub fn get(&self, task_id: usize) -> Option<&Task> {
        // Tasks are ordered by id.
        self.tasks
            .binary_search_by_key(&task_id, |task| task.id)
            .ok()
            .map(|index| &self.tasks[index])
    }
}

/// Broadcasts snapshots of the task list to all observers.
#[derive(Debug)]
pub struct Publisher {
    sender: watch::Sender<Snapshot>,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(Snapshot::default());
        Publisher { sender }
    }

    /// Publish a new snapshot of the given state.
    ///
    /// Snapshots that are older than the currently published one are dropped.
    pub fn publish(&self, state: &mut InternalState) {
        state.revision += 1;
        let snapshot = Snapshot {
            revision: state.revision,
            tasks: Arc::new(state.task_list()),
        };

        self.sender.send_if_modified(|current| {
            if snapshot.revision <= current.revision {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> Snapshot {
        self.sender.borrow().clone()
    }
}
