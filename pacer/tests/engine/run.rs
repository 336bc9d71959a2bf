use std::{fs::create_dir, thread};

use pacer_lib::{log::list_execution_logs, task::TaskStatus};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::{helper::*, internal_prelude::*};

/// A command that prints something and exits with `0` ends up as `Finished`, with the output
/// stored on the task and an execution log on disk.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_successful_run() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("unit", "echo TestUnit", 0);

    assert!(engine.run(task.id), "The task should be started.");
    let task = wait_for_completion(&engine, task.id).await?;

    assert_eq!(task.status, TaskStatus::Finished);
    assert_eq!(task.output, "TestUnit\n");
    assert_eq!(task.last_error, "");
    assert!(task.last_run_at.is_some());

    let logs = list_execution_logs(task.id, &engine.settings.shared.log_directory())?;
    assert_eq!(logs.len(), 1, "Exactly one execution log should be written.");

    Ok(())
}

/// Failing commands end up as `Failed` with a proper error message.
#[rstest]
#[case("exit 3", "Exit code: 3")]
#[case("kill -9 $$", "Killed by signal 9")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_run(#[case] command: &str, #[case] error: &str) -> Result<()> {
    let engine = engine()?;
    let task = engine.add("failing", command, 0);

    engine.run(task.id);
    let task = wait_for_completion(&engine, task.id).await?;

    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.last_error, error);
    assert!(task.last_run_at.is_some());

    Ok(())
}

/// Concurrent run requests for the same task result in exactly one execution.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_execution_per_task() -> Result<()> {
    let engine = engine()?;
    let task = engine.add("sleeper", "sleep 60", 0);

    let started: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| engine.run(task.id)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });
    assert_eq!(started.iter().filter(|started| **started).count(), 1);

    // Further requests are ignored as well, while the task is running.
    assert!(!engine.run(task.id));
    assert!(engine.get(task.id).unwrap().is_running());

    engine.shutdown_and_wait().await;

    Ok(())
}

/// Unknown and disabled tasks are never started.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_ineligible_tasks() -> Result<()> {
    let engine = engine()?;
    assert!(!engine.run(42), "Unknown tasks can't be started.");

    let task = engine.add("disabled", "echo nope", 0);
    engine.set_enabled(task.id, false);
    assert!(!engine.run(task.id), "Disabled tasks can't be started.");

    let task = engine.get(task.id).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.last_run_at.is_none());

    Ok(())
}

/// The process is started in the task's working directory and with its environment variables.
/// The task's variables take precedence over the globally configured ones.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_environment_and_working_directory() -> Result<()> {
    let (mut settings, tempdir) = base_setup()?;
    settings
        .engine
        .env_vars
        .insert("PACER_GLOBAL".into(), "global".into());
    settings
        .engine
        .env_vars
        .insert("PACER_OVERWRITTEN".into(), "global".into());
    let engine = engine_with_settings(settings, tempdir)?;

    let workdir = engine.file("workdir");
    create_dir(&workdir)?;

    let mut edit = task_edit("env", "echo $PACER_GLOBAL $PACER_OVERWRITTEN $PACER_TASK; pwd");
    edit.working_directory = Some(workdir.clone());
    edit.envs.insert("PACER_OVERWRITTEN".into(), "task".into());
    edit.envs.insert("PACER_TASK".into(), "task".into());
    let task = engine.add_with(edit);

    engine.run(task.id);
    let task = wait_for_completion(&engine, task.id).await?;

    assert_eq!(task.status, TaskStatus::Finished);
    assert_eq!(
        task.output,
        format!("global task task\n{}\n", workdir.to_string_lossy())
    );

    Ok(())
}

/// A working directory that doesn't exist doesn't prevent the task from running.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_working_directory() -> Result<()> {
    let engine = engine()?;
    let mut edit = task_edit("missing dir", "echo still running");
    edit.working_directory = Some(engine.path().join("does_not_exist"));
    let task = engine.add_with(edit);

    engine.run(task.id);
    let task = wait_for_completion(&engine, task.id).await?;

    assert_eq!(task.status, TaskStatus::Finished);
    assert_eq!(task.output, "still running\n");

    Ok(())
}

/// If the process cannot even be spawned, the task fails with the reason.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_spawn_failure() -> Result<()> {
    let (mut settings, tempdir) = base_setup()?;
    settings.engine.shell_command = Some(vec![
        "/this/shell/does/not/exist".into(),
        "{{ pacer_command_string }}".into(),
    ]);
    let engine = engine_with_settings(settings, tempdir)?;
    let task = engine.add("broken", "echo hello", 0);

    engine.run(task.id);
    let task = wait_for_completion(&engine, task.id).await?;

    assert_eq!(task.status, TaskStatus::Failed);
    assert!(
        task.last_error.starts_with("Failed to spawn command: echo hello"),
        "Unexpected error: {}",
        task.last_error
    );
    assert!(task.last_run_at.is_some());

    Ok(())
}

/// Each run starts with a clean output.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rerun_clears_previous_run() -> Result<()> {
    let engine = engine()?;
    let file = engine.file("runs");
    let command = format!("echo run >> '{}'; cat '{}'", file.display(), file.display());
    let task = engine.add("rerun", &command, 0);

    engine.run(task.id);
    let task = wait_for_completion(&engine, task.id).await?;
    assert_eq!(task.output, "run\n");

    engine.run(task.id);
    let task = wait_for_completion(&engine, task.id).await?;
    assert_eq!(task.output, "run\nrun\n");

    let logs = list_execution_logs(task.id, &engine.settings.shared.log_directory())?;
    assert_eq!(logs.len(), 2);

    Ok(())
}
