use pretty_assertions::assert_eq;

use crate::{helper::*, internal_prelude::*};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("short lived", "echo hi", 0);

    assert!(engine.remove(task.id));
    assert!(engine.get(task.id).is_none());
    assert!(!engine.remove(task.id), "A task can only be removed once.");
    assert_eq!(engine.list().len(), 0);

    Ok(())
}

/// Removing a running task cancels its execution first.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_running_task() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("sleeper", "sleep 60", 0);
    engine.run(task.id);

    assert!(engine.remove(task.id));
    assert!(engine.get(task.id).is_none());
    assert!(!engine.cancel(task.id), "There should be no active execution left.");

    // The supervisor of the cancelled execution must not resurrect the task.
    engine.shutdown_and_wait().await;
    assert!(engine.get(task.id).is_none());

    Ok(())
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_remove_kills_process_tree() -> Result<()> {
    let engine = engine()?;
    let pid_file = engine.file("pids");
    let task = engine.add("tree", &process_tree_command(&pid_file), 0);
    engine.run(task.id);

    let pids = wait_for_pids(&pid_file, 2).await?;
    assert!(engine.remove(task.id));
    wait_for_processes_to_exit(&pids).await?;

    Ok(())
}
