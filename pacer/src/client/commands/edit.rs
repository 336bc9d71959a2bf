use std::path::PathBuf;

use pacer_lib::task::TaskEdit;

use super::get_task;
use crate::{
    client::{display::print_success, OutputStyle},
    engine::Engine,
    internal_prelude::*,
};

/// The properties that should be changed by `pacer edit`.
/// Everything that's `None` or empty is left as it is.
pub struct EditOptions {
    pub name: Option<String>,
    pub command: Option<String>,
    pub interval: Option<i64>,
    pub timeout: Option<i64>,
    pub working_directory: Option<PathBuf>,
    pub unset_working_directory: bool,
    pub envs: Vec<(String, String)>,
    pub unset_envs: Vec<String>,
}

pub fn edit(
    engine: &Engine,
    style: &OutputStyle,
    task_id: usize,
    options: EditOptions,
) -> Result<()> {
    let task = get_task(engine, task_id)?;
    let mut edit = TaskEdit::from_task(&task);

    if let Some(name) = options.name {
        edit.name = name;
    }
    if let Some(command) = options.command {
        edit.command = command;
    }
    if let Some(interval) = options.interval {
        edit.interval = interval;
    }
    if let Some(timeout) = options.timeout {
        edit.timeout = timeout;
    }
    if options.unset_working_directory {
        edit.working_directory = None;
    } else if let Some(path) = options.working_directory {
        edit.working_directory = Some(path);
    }
    for key in &options.unset_envs {
        edit.envs.remove(key);
    }
    edit.envs.extend(options.envs);
    edit.validate()?;

    if !engine.update(task_id, edit) {
        bail!("Task {task_id} has been removed in the meantime");
    }

    print_success(style, &format!("Task {task_id} updated."));

    Ok(())
}
