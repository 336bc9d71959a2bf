//! The task execution and scheduling engine.
//!
//! The [Engine] owns all tasks, spawns and supervises their processes, runs the scheduler and
//! persists task definitions. Observers follow all changes via [Snapshot]s.
use std::{
    fs::create_dir_all,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};

use pacer_lib::{error::Error, settings::Settings, store::Store};
use tokio::{runtime::Handle, sync::watch};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    engine::{
        internal_state::{state::InternalState, LockedState},
        publisher::Publisher,
        scheduler::SchedulerHandle,
    },
    internal_prelude::*,
};

/// The engine's state representation, which includes process related data that's never
/// exposed to observers.
pub mod internal_state;
mod process_handler;
pub mod publisher;
mod registry;
mod scheduler;

pub use publisher::Snapshot;

pub const CANCELLED_BY_USER: &str = "Cancelled by user";
pub const CANCELLED_ON_SHUTDOWN: &str = "Cancelled on shutdown";

/// The handle to the task engine.
///
/// This is a cheap handle that can be cloned and shared between threads.
/// All clones refer to the same engine.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    settings: Settings,
    state: Mutex<InternalState>,
    store: Store,
    publisher: Publisher,
    scheduler: Mutex<Option<SchedulerHandle>>,
    /// The engine-wide token. Every execution and the scheduler get a child token.
    token: CancellationToken,
    /// Tracks all executions and the scheduler, so we can wait for them during shutdown.
    tracker: TaskTracker,
    runtime: Handle,
}

impl Engine {
    /// Create a new engine on the current tokio runtime.
    ///
    /// Previously persisted tasks are restored. A missing or broken task store results in an
    /// empty task list.
    pub fn new(settings: Settings) -> Result<Engine> {
        let runtime =
            Handle::try_current().wrap_err("The engine has to be created inside a tokio runtime")?;

        Engine::with_runtime(settings, runtime)
    }

    /// Create a new engine, whose background work is executed on the given runtime.
    pub fn with_runtime(settings: Settings, runtime: Handle) -> Result<Engine> {
        init_directories(&settings.shared.data_directory(), &settings.shared.log_directory())?;

        let store = Store::new(settings.shared.store_path());
        let mut state = match store.load() {
            Ok(Some(tasks)) => {
                info!("Restored {} tasks from {:?}", tasks.len(), store.path());
                InternalState::from_tasks(tasks)
            }
            Ok(None) => InternalState::default(),
            Err(error) => {
                warn!("Failed to restore previous tasks:\n {error}");
                warn!("Using clean state instead.");
                InternalState::default()
            }
        };

        let publisher = Publisher::new();
        publisher.publish(&mut state);

        Ok(Engine {
            inner: Arc::new(Inner {
                settings,
                state: Mutex::new(state),
                store,
                publisher,
                scheduler: Mutex::new(None),
                token: CancellationToken::new(),
                tracker: TaskTracker::new(),
                runtime,
            }),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Subscribe to all future snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.publisher.subscribe()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.publisher.current()
    }

    /// Whether [Engine::shutdown] has been called.
    pub fn is_shut_down(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Gracefully shut the engine down.
    ///
    /// The scheduler is stopped and all in-flight executions are cancelled.
    /// Use [Engine::wait] afterwards, to wait until all executions have been cleaned up.
    pub fn shutdown(&self) {
        info!("Shutting down the engine");
        self.stop_scheduler();

        let task_ids = self.inner.lock_state().executions.task_ids();
        for task_id in task_ids {
            self.abort_execution(task_id, CANCELLED_ON_SHUTDOWN);
        }

        self.inner.token.cancel();
        self.inner.tracker.close();
    }

    /// Wait until all executions and the scheduler have finished.
    ///
    /// This only returns after [Engine::shutdown] has been called.
    pub async fn wait(&self) {
        self.inner.tracker.wait().await;
        debug!("All engine tasks finished");
    }
}

impl Inner {
    pub(crate) fn lock_state(&self) -> LockedState<'_> {
        // A panic while holding the lock doesn't leave the task map in an invalid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist all task definitions and publish a new snapshot.
    ///
    /// Persistence is best-effort. Failures are logged, the in-memory state stays authoritative.
    pub(crate) fn save_and_publish(&self, state: &mut LockedState) {
        if let Err(error) = self.store.save(state.tasks.values()) {
            error!("Failed to persist tasks: {error}");
        }
        self.publisher.publish(state);
    }

    pub(crate) fn publish(&self, state: &mut LockedState) {
        self.publisher.publish(state);
    }
}

/// Initialize all directories needed for normal operation.
fn init_directories(data_dir: &Path, log_dir: &Path) -> Result<()> {
    if !data_dir.exists() {
        create_dir_all(data_dir).map_err(|err| {
            Error::IoPathError(data_dir.to_path_buf(), "creating data directory", err)
        })?;
    }

    if !log_dir.exists() {
        create_dir_all(log_dir)
            .map_err(|err| Error::IoPathError(log_dir.to_path_buf(), "creating log directory", err))?;
    }

    Ok(())
}
