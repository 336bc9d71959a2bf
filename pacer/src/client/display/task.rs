use pacer_lib::task::Task;

use super::{format_seconds, headline, status_color};
use crate::client::OutputStyle;

/// All details of a single task, including the output of its last run.
pub fn format_task_details(task: &Task, style: &OutputStyle) -> String {
    let mut lines = vec![
        headline(style, &format!("Task {}: {}", task.id, task.name)),
        format!("Command:           {}", task.command),
        format!(
            "Status:            {}",
            style.style_text(task.status, Some(status_color(task.status)), None)
        ),
        format!("Enabled:           {}", task.enabled),
        format!("Interval:          {}", format_seconds(task.interval)),
        format!("Timeout:           {}", format_seconds(task.timeout)),
    ];

    if let Some(path) = &task.working_directory {
        lines.push(format!("Working directory: {}", path.display()));
    }
    if let Some(last_run) = task.last_run_at {
        lines.push(format!(
            "Last run:          {}",
            last_run.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if !task.envs.is_empty() {
        let keys: Vec<&str> = task.envs.keys().map(String::as_str).collect();
        lines.push(format!("Environment:       {}", keys.join(", ")));
    }

    if !task.output.is_empty() {
        lines.push(String::new());
        lines.push(headline(style, "Output:"));
        lines.push(task.output.trim_end().to_string());
    }
    if !task.last_error.is_empty() {
        lines.push(String::new());
        lines.push(headline(style, "Error:"));
        lines.push(task.last_error.clone());
    }

    lines.join("\n")
}
