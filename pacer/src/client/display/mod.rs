use crossterm::style::{Attribute, Color};
use pacer_lib::task::TaskStatus;

use super::OutputStyle;

mod task;
mod table;

pub use task::format_task_details;
pub use table::build_status_table;

/// Used to style any generic success message from the engine.
pub fn print_success(_style: &OutputStyle, message: &str) {
    println!("{message}");
}

/// Used to style any generic failure message.
pub fn print_error(style: &OutputStyle, message: &str) {
    let styled = style.style_text(message, Some(Color::Red), None);
    eprintln!("{styled}");
}

/// Headlines of detail views.
pub fn headline(style: &OutputStyle, text: &str) -> String {
    style.style_text(text, None, Some(Attribute::Bold))
}

/// The color a status is displayed with.
pub fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Pending => Color::Yellow,
        TaskStatus::Running => Color::Green,
        TaskStatus::Finished => Color::Green,
        TaskStatus::Failed => Color::Red,
    }
}

/// Format a duration in seconds for humans, `0` is displayed as `-`.
pub fn format_seconds(seconds: u64) -> String {
    match seconds {
        0 => "-".to_string(),
        seconds if seconds % 3600 == 0 => format!("{}h", seconds / 3600),
        seconds if seconds % 60 == 0 => format!("{}m", seconds / 60),
        seconds => format!("{seconds}s"),
    }
}
