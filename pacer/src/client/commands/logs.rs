use std::fs::read_to_string;

use pacer_lib::log::list_execution_logs;

use super::get_task;
use crate::{engine::Engine, internal_prelude::*};

/// Print the execution logs of a task.
///
/// Either the content of the last `last` logs, or only the paths of all logs.
pub fn print_logs(engine: &Engine, task_id: usize, list: bool, last: usize) -> Result<()> {
    // Logs of removed tasks are still around, but we only show logs of known tasks.
    get_task(engine, task_id)?;

    let log_directory = engine.settings().shared.log_directory();
    let logs = list_execution_logs(task_id, &log_directory)?;
    if logs.is_empty() {
        println!("Task {task_id} hasn't been executed yet.");
        return Ok(());
    }

    if list {
        for path in logs {
            println!("{}", path.display());
        }
        return Ok(());
    }

    let skip = logs.len().saturating_sub(last);
    for (index, path) in logs.iter().skip(skip).enumerate() {
        if index > 0 {
            println!();
        }
        let content = read_to_string(path)
            .wrap_err_with(|| format!("Failed to read execution log at {path:?}"))?;
        print!("{content}");
    }

    Ok(())
}
