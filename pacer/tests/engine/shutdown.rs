use pacer::engine::CANCELLED_ON_SHUTDOWN;
use pacer_lib::task::TaskStatus;
use pretty_assertions::assert_eq;

use crate::{helper::*, internal_prelude::*};

/// Shutting down cancels all running tasks and stops the scheduler.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown() -> Result<()> {
    let engine = engine()?;
    let first = engine.add("first", "sleep 60", 0);
    let second = engine.add("second", "sleep 60", 0);
    let done = engine.add("done", "echo done", 0);
    engine.run(done.id);
    wait_for_completion(&engine, done.id).await?;
    engine.run(first.id);
    engine.run(second.id);
    engine.start_scheduler();

    engine.shutdown_and_wait().await;

    assert!(engine.is_shut_down());
    assert!(!engine.is_scheduler_running());
    for task_id in [first.id, second.id] {
        let task = engine.get(task_id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.last_error, CANCELLED_ON_SHUTDOWN);
    }
    assert_eq!(engine.get(done.id).unwrap().status, TaskStatus::Finished);

    Ok(())
}

/// Nothing can be started once the engine has been shut down.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_runs_after_shutdown() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("late", "echo late", 1);

    engine.shutdown_and_wait().await;

    assert!(!engine.run(task.id));
    engine.start_scheduler();
    assert!(!engine.is_scheduler_running());
    assert_eq!(engine.get(task.id).unwrap().status, TaskStatus::Pending);

    // The task definitions can still be managed.
    assert!(engine.set_enabled(task.id, false));

    Ok(())
}

/// All cancelled executions are logged before `wait` returns.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_writes_logs() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("sleeper", "echo sleeping; sleep 60", 0);
    engine.run(task.id);
    wait_for_task_condition(&engine, task.id, |task| !task.output.is_empty()).await?;

    engine.shutdown_and_wait().await;

    let logs = pacer_lib::log::list_execution_logs(task.id, &engine.settings.shared.log_directory())?;
    assert_eq!(logs.len(), 1);
    let content = std::fs::read_to_string(&logs[0])?;
    assert!(content.contains("sleeping"));
    assert!(content.contains(CANCELLED_ON_SHUTDOWN));

    Ok(())
}
