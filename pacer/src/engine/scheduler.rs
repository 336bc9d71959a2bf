use std::sync::PoisonError;

use chrono::{DateTime, Local};
use tokio::{
    select,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::Engine;
use crate::internal_prelude::*;

/// The handle of the running scheduler loop.
pub(crate) struct SchedulerHandle {
    token: CancellationToken,
}

impl Engine {
    /// Start the scheduler, which periodically starts all due interval tasks.
    ///
    /// Starting an already running scheduler does nothing.
    pub fn start_scheduler(&self) {
        let mut scheduler = self
            .inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if scheduler.is_some() {
            debug!("The scheduler is already running");
            return;
        }
        if self.inner.token.is_cancelled() {
            warn!("The engine is shutting down, not starting the scheduler");
            return;
        }

        let token = self.inner.token.child_token();
        let engine = self.clone();
        self.inner
            .tracker
            .spawn_on(engine.scheduler_loop(token.clone()), &self.inner.runtime);

        info!("Scheduler started");
        *scheduler = Some(SchedulerHandle { token });
    }

    /// Stop the scheduler. In-flight executions aren't affected.
    pub fn stop_scheduler(&self) {
        let handle = self
            .inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.token.cancel();
            info!("Scheduler stopped");
        }
    }

    pub fn is_scheduler_running(&self) -> bool {
        self.inner
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Start every task that's due at the given point in time.
    /// Returns the ids of all tasks that have been started.
    pub fn run_due_tasks(&self, now: DateTime<Local>) -> Vec<usize> {
        let due: Vec<usize> = {
            let state = self.inner.lock_state();
            state
                .tasks
                .values()
                .filter(|task| task.is_due(now) && !state.executions.contains(task.id))
                .map(|task| task.id)
                .collect()
        };

        due.into_iter()
            .filter(|task_id| {
                trace!("Task {task_id} is due");
                self.run(*task_id)
            })
            .collect()
    }

    async fn scheduler_loop(self, token: CancellationToken) {
        let mut ticker = interval(self.inner.settings.engine.scheduler_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_due_tasks(Local::now());
                }
            }
        }

        debug!("Scheduler loop exited");
    }
}
