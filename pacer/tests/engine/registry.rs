use pacer_lib::task::{TaskEdit, TaskStatus};
use pretty_assertions::assert_eq;

use crate::{helper::*, internal_prelude::*};

/// Input is normalized instead of rejected.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_add_normalizes_input() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("  padded  ", "\techo hi \n", -10);

    assert_eq!(task.id, 1);
    assert_eq!(task.name, "padded");
    assert_eq!(task.command, "echo hi");
    assert_eq!(task.interval, 0);
    assert!(task.enabled);
    assert_eq!(task.status, TaskStatus::Pending);

    Ok(())
}

/// Ids are handed out in ascending order and are never reused.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_ids_are_never_reused() -> Result<()> {
    let engine = engine()?;
    let first = engine.add("first", "echo 1", 0);
    let second = engine.add("second", "echo 2", 0);
    assert_eq!((first.id, second.id), (1, 2));

    assert!(engine.remove(second.id));
    let third = engine.add("third", "echo 3", 0);
    assert_eq!(third.id, 3);

    let ids: Vec<usize> = engine.list().iter().map(|task| task.id).collect();
    assert_eq!(ids, vec![1, 3]);

    Ok(())
}

/// A full update replaces the definition, but keeps the run state.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("before", "echo before", 0);
    engine.run(task.id);
    wait_for_completion(&engine, task.id).await?;

    let mut edit = TaskEdit::from_task(&engine.get(task.id).unwrap());
    edit.name = " after ".into();
    edit.command = "echo after".into();
    edit.interval = 60;
    edit.timeout = -1;
    edit.envs.insert("KEY".into(), "value".into());
    assert!(engine.update(task.id, edit.clone()));
    assert!(!engine.update(99, edit));

    let task = engine.get(task.id).unwrap();
    assert_eq!(task.name, "after");
    assert_eq!(task.command, "echo after");
    assert_eq!(task.interval, 60);
    assert_eq!(task.timeout, 0);
    assert_eq!(task.envs.get("KEY").map(String::as_str), Some("value"));
    assert_eq!(task.status, TaskStatus::Finished);
    assert_eq!(task.output, "before\n");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_enabled() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("toggle", "echo toggle", 0);

    assert!(engine.set_enabled(task.id, false));
    assert!(!engine.get(task.id).unwrap().enabled);
    assert!(engine.set_enabled(task.id, true));
    assert!(engine.get(task.id).unwrap().enabled);
    assert!(!engine.set_enabled(12, true));

    Ok(())
}

/// Every mutation publishes a new snapshot with a higher revision.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_snapshots() -> Result<()> {
    let engine = engine()?;
    let initial = engine.snapshot();
    assert!(initial.tasks.is_empty());

    let mut receiver = engine.subscribe();
    engine.add("b", "echo b", 0);
    engine.add("a", "echo a", 0);
    assert!(receiver.has_changed()?);

    let snapshot = receiver.borrow_and_update().clone();
    assert!(snapshot.revision > initial.revision);
    let names: Vec<&str> = snapshot.tasks.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["b", "a"], "Snapshots are ordered by id.");
    assert_eq!(snapshot.get(2).map(|task| task.name.as_str()), Some("a"));

    // Snapshots are immutable, later changes don't affect them.
    engine.set_enabled(1, false);
    assert!(snapshot.tasks[0].enabled);
    assert!(!engine.snapshot().tasks[0].enabled);

    Ok(())
}
