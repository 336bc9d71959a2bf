use pacer_lib::task::TaskStatus;
use pretty_assertions::assert_eq;

use crate::{helper::*, internal_prelude::*};

/// A duplicate gets a new id and the full definition, but none of the run state.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate() -> Result<()> {
    let engine = engine()?;
    let mut edit = task_edit("original", "echo original");
    edit.interval = 300;
    edit.timeout = 5;
    edit.working_directory = Some(engine.path().to_path_buf());
    edit.envs.insert("KEY".into(), "value".into());
    let original = engine.add_with(edit);

    engine.run(original.id);
    let original = wait_for_completion(&engine, original.id).await?;
    assert_eq!(original.status, TaskStatus::Finished);

    let copy = engine.duplicate(original.id).unwrap();
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.name, original.name);
    assert_eq!(copy.command, original.command);
    assert_eq!(copy.interval, original.interval);
    assert_eq!(copy.timeout, original.timeout);
    assert_eq!(copy.enabled, original.enabled);
    assert_eq!(copy.working_directory, original.working_directory);
    assert_eq!(copy.envs, original.envs);

    assert_eq!(copy.status, TaskStatus::Pending);
    assert_eq!(copy.output, "");
    assert_eq!(copy.last_error, "");
    assert!(copy.last_run_at.is_none());

    assert_eq!(engine.list().len(), 2);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_duplicate_unknown_task() -> Result<()> {
    let engine = engine()?;
    assert!(engine.duplicate(3).is_none());
    assert!(engine.list().is_empty());

    Ok(())
}
