use comfy_table::{presets::UTF8_HORIZONTAL_ONLY, Cell, ContentArrangement, Row, Table};
use crossterm::style::Color;
use pacer_lib::task::Task;

use super::{format_seconds, status_color};
use crate::client::OutputStyle;

/// Build the status table of all tasks.
pub fn build_status_table(tasks: &[Task], style: &OutputStyle) -> Table {
    let mut table = Table::new();
    table
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(UTF8_HORIZONTAL_ONLY)
        .set_header(vec![
            "Id", "Name", "Status", "Interval", "Timeout", "Last run", "Command",
        ])
        .add_rows(tasks.iter().map(|task| build_row(task, style)));

    // Explicitly force styling, in case we aren't on a tty, but `--color=always` is set.
    if style.enabled {
        table.enforce_styling();
    }

    table
}

fn build_row(task: &Task, style: &OutputStyle) -> Row {
    let mut row = Row::new();
    row.max_height(1);
    row.add_cell(Cell::new(task.id));

    if task.enabled {
        row.add_cell(Cell::new(&task.name));
    } else {
        row.add_cell(style.styled_cell(format!("{} (disabled)", task.name), Some(Color::Grey)));
    }

    row.add_cell(style.styled_cell(task.status, Some(status_color(task.status))));
    row.add_cell(Cell::new(format_seconds(task.interval)));
    row.add_cell(Cell::new(format_seconds(task.timeout)));

    let last_run = task
        .last_run_at
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    row.add_cell(Cell::new(last_run));
    row.add_cell(Cell::new(&task.command));

    row
}
