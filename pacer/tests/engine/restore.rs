use std::fs::write;

use pacer::Engine;
use pacer_lib::task::TaskStatus;
use pretty_assertions::assert_eq;

use crate::{helper::*, internal_prelude::*};

/// All task definitions survive a restart. The run state doesn't.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restore_definitions() -> Result<()> {
    better_panic::install();
    let engine = engine()?;
    let mut edit = task_edit("with options", "echo 'multi\nline'");
    edit.interval = 120;
    edit.timeout = 7;
    edit.working_directory = Some(engine.path().to_path_buf());
    edit.envs.insert("KEY".into(), "value with = sign".into());
    edit.enabled = false;
    engine.add_with(edit);
    let simple = engine.add("simple", "echo simple", 0);
    engine.add("removed", "echo removed", 0);
    engine.remove(3);

    engine.run(simple.id);
    wait_for_completion(&engine, simple.id).await?;
    let before = engine.list();
    engine.shutdown_and_wait().await;

    let restored = Engine::new(engine.settings.clone())?;
    let after = restored.list();
    assert_eq!(after.len(), 2);
    for (before, after) in before.iter().zip(after.iter()) {
        assert_eq!(after.id, before.id);
        assert_eq!(after.name, before.name);
        assert_eq!(after.command, before.command);
        assert_eq!(after.interval, before.interval);
        assert_eq!(after.enabled, before.enabled);
        assert_eq!(after.working_directory, before.working_directory);
        assert_eq!(after.timeout, before.timeout);
        assert_eq!(after.envs, before.envs);

        assert_eq!(after.status, TaskStatus::Pending);
        assert_eq!(after.output, "");
        assert!(after.last_run_at.is_none());
    }

    // New ids continue after the highest restored id.
    let task = restored.add("new", "echo new", 0);
    assert_eq!(task.id, 3);

    Ok(())
}

/// A broken task store results in an empty engine instead of an error.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_broken_store() -> Result<()> {
    let (settings, tempdir) = base_setup()?;
    write(settings.shared.store_path(), "this is not a task store")?;

    let engine = engine_with_settings(settings, tempdir)?;
    assert!(engine.list().is_empty());

    // The engine is fully functional and overwrites the broken store.
    engine.add("fresh", "echo fresh", 0);
    let restored = Engine::new(engine.settings.clone())?;
    assert_eq!(restored.list().len(), 1);

    Ok(())
}
