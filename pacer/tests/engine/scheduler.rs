use chrono::{Local, TimeDelta};
use pacer_lib::task::TaskStatus;
use pretty_assertions::assert_eq;

use crate::{helper::*, internal_prelude::*};

/// An interval task that never ran is started on the next scheduler tick.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interval_task_is_started() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("scheduled", "echo scheduled", 3600);

    engine.start_scheduler();
    assert!(engine.is_scheduler_running());

    let task = wait_for_task_condition(&engine, task.id, |task| {
        task.status == TaskStatus::Finished
    })
    .await?;
    assert_eq!(task.output, "scheduled\n");

    engine.shutdown_and_wait().await;

    Ok(())
}

/// Manual and disabled tasks are ignored by the scheduler.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ineligible_tasks_are_ignored() -> Result<()> {
    let engine = engine()?;
    let manual = engine.add("manual", "echo manual", 0);
    let disabled = engine.add("disabled", "echo disabled", 1);
    engine.set_enabled(disabled.id, false);

    engine.start_scheduler();
    // Wait for a few scheduler ticks.
    sleep_ms(500).await;

    for task_id in [manual.id, disabled.id] {
        let task = engine.get(task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.last_run_at.is_none());
    }

    engine.shutdown_and_wait().await;

    Ok(())
}

/// A task is due once its interval has passed since its last run.
/// Running tasks are never started a second time.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_due_tasks() -> Result<()> {
    let engine = engine()?;
    let quick = engine.add("quick", "echo quick", 60);
    let slow = engine.add("slow", "sleep 60", 60);

    let started = engine.run_due_tasks(Local::now());
    assert_eq!(started, vec![quick.id, slow.id]);

    // The slow task is still running and the quick one just ran.
    let quick_task = wait_for_completion(&engine, quick.id).await?;
    let last_run = quick_task.last_run_at.unwrap();
    assert_eq!(engine.run_due_tasks(last_run), Vec::<usize>::new());

    // The quick task is due again once its interval has passed.
    let later = last_run + TimeDelta::seconds(60);
    assert_eq!(engine.run_due_tasks(later), vec![quick.id]);

    engine.shutdown_and_wait().await;

    Ok(())
}

/// Starting the scheduler twice doesn't do any harm and it can be stopped again.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_and_stop() -> Result<()> {
    let engine = engine()?;
    assert!(!engine.is_scheduler_running());

    engine.start_scheduler();
    engine.start_scheduler();
    assert!(engine.is_scheduler_running());

    engine.stop_scheduler();
    assert!(!engine.is_scheduler_running());

    // Tasks aren't picked up anymore.
    let task = engine.add("scheduled", "echo scheduled", 1);
    sleep_ms(500).await;
    assert!(engine.get(task.id).unwrap().last_run_at.is_none());

    Ok(())
}
