use std::path::PathBuf;

use pacer_lib::task::{looks_long_running, TaskEdit};

use crate::{
    client::{display::print_success, OutputStyle},
    engine::Engine,
    internal_prelude::*,
};

/// Everything the user passed to `pacer add`.
pub struct AddOptions {
    pub command: String,
    pub name: Option<String>,
    pub interval: i64,
    pub timeout: i64,
    pub working_directory: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    pub disabled: bool,
    pub print_task_id: bool,
}

pub fn add_task(engine: &Engine, style: &OutputStyle, options: AddOptions) -> Result<()> {
    let edit = TaskEdit {
        name: options.name.unwrap_or_else(|| options.command.clone()),
        command: options.command,
        interval: options.interval,
        enabled: !options.disabled,
        working_directory: options.working_directory,
        timeout: options.timeout,
        envs: options.envs.into_iter().collect(),
    };
    edit.validate()?;

    if edit.interval == 0 && looks_long_running(&edit.command) {
        warn!(
            "'{}' probably never stops on its own. Consider running it with a timeout.",
            edit.command
        );
    }

    let task = engine.add_with(edit);

    if options.print_task_id {
        println!("{}", task.id);
    } else {
        print_success(style, &format!("New task added (id {}).", task.id));
    }

    Ok(())
}
