use std::io::{stdout, Write};

use pacer_lib::task::{Task, TaskStatus, OUTPUT_TRUNCATION_MARKER};
use tokio::select;

use super::{get_task, interrupt_token};
use crate::{
    client::{
        display::{print_error, print_success},
        OutputStyle,
    },
    engine::Engine,
    internal_prelude::*,
};

/// Run a single task and stream its output to stdout until it's done.
///
/// The first Ctrl-C cancels the execution.
pub async fn run_in_foreground(engine: &Engine, style: &OutputStyle, task_id: usize) -> Result<()> {
    let task = get_task(engine, task_id)?;
    if !task.enabled {
        bail!("Task {task_id} is disabled. Enable it first via `pacer enable {task_id}`.");
    }

    let interrupted = interrupt_token()?;
    let mut receiver = engine.subscribe();
    if !engine.run(task_id) {
        bail!("Failed to start task {task_id}");
    }

    let mut follower = OutputFollower::default();
    let mut cancel_requested = false;
    let task = loop {
        {
            let snapshot = receiver.borrow_and_update();
            let Some(task) = snapshot.get(task_id) else {
                bail!("Task {task_id} has been removed while it was running");
            };
            print_chunk(&follower.next_chunk(task))?;
            if !task.is_running() {
                break task.clone();
            }
        }

        select! {
            _ = interrupted.cancelled(), if !cancel_requested => {
                cancel_requested = true;
                engine.cancel(task_id);
            }
            changed = receiver.changed() => {
                if changed.is_err() {
                    bail!("The engine stopped while task {task_id} was running");
                }
            }
        }
    };

    engine.shutdown();
    engine.wait().await;

    match task.status {
        TaskStatus::Finished => {
            print_success(style, &format!("Task {task_id} finished successfully."));
            Ok(())
        }
        TaskStatus::Failed => {
            print_error(style, &format!("Task {task_id} failed: {}", task.last_error));
            bail!("Task {task_id} failed");
        }
        _ => {
            print_error(style, &format!("Task {task_id}: {}", task.last_error));
            Ok(())
        }
    }
}

/// Keeps track of how much of a task's output has already been printed.
#[derive(Debug, Default)]
struct OutputFollower {
    printed: usize,
    truncated: bool,
}

impl OutputFollower {
    /// Everything that has been appended to the output since the last call.
    ///
    /// Once the output has been truncated, the kept part is completed and the truncation marker
    /// is returned exactly once. Nothing is returned afterwards.
    fn next_chunk(&mut self, task: &Task) -> String {
        if self.truncated {
            return String::new();
        }

        if !task.output_truncated {
            let chunk = task.output.get(self.printed..).unwrap_or_default().to_string();
            self.printed = task.output.len();
            return chunk;
        }

        self.truncated = true;
        let kept = task
            .output
            .len()
            .saturating_sub(OUTPUT_TRUNCATION_MARKER.len());
        let mut chunk = task
            .output
            .get(self.printed..kept)
            .unwrap_or_default()
            .to_string();
        chunk.push_str(OUTPUT_TRUNCATION_MARKER);

        chunk
    }
}

fn print_chunk(chunk: &str) -> Result<()> {
    if chunk.is_empty() {
        return Ok(());
    }

    let mut stdout = stdout().lock();
    stdout.write_all(chunk.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
