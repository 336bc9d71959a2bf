//! Subprocess handling is platform specific code.
//!
//! The submodules of this module represent the different implementations for
//! each supported platform.
//! Depending on the target, the respective platform is read and loaded into this scope.
use std::{collections::HashMap, io, process::Command};

use command_group::AsyncGroupChild;
use pacer_lib::Settings;

use crate::internal_prelude::*;

// Unix specific process handling
// Shared between Linux and Apple
#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use self::unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use self::windows::*;

/// The placeholder inside the shell command template that's replaced by the task's command.
pub const COMMAND_PLACEHOLDER: &str = "pacer_command_string";

/// Take a platform specific shell command and insert the actual task command via templating.
pub fn compile_shell_command(settings: &Settings, command: &str) -> Result<Command> {
    let shell_command = get_shell_command(settings);

    let mut handlebars = handlebars::Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);

    // Make the command available to the template engine.
    let mut parameters = HashMap::new();
    parameters.insert(COMMAND_PLACEHOLDER, command);

    // We allow users to provide their own shell command.
    // They should use the `{{ pacer_command_string }}` placeholder.
    let mut compiled_command = Vec::new();
    for part in shell_command {
        let compiled_part = handlebars
            .render_template(&part, &parameters)
            .wrap_err_with(|| format!("Failed to render shell command template: {part}"))?;

        compiled_command.push(compiled_part);
    }

    if compiled_command.is_empty() {
        bail!("The configured shell command is empty.");
    }
    let executable = compiled_command.remove(0);

    let mut command = Command::new(executable);
    for arg in compiled_command {
        command.arg(&arg);
    }

    // Inject custom environment variables.
    if !settings.engine.env_vars.is_empty() {
        debug!(
            "Inject environment variables: {:?}",
            settings.engine.env_vars.keys()
        );
        command.envs(&settings.engine.env_vars);
    }

    debug!(message = "Prepared command before spawn", ?command);

    Ok(command)
}

/// This is a helper function to safely kill a child process group.
/// Its purpose is to properly kill all processes and prevent any dangling processes.
///
/// The process is reaped afterwards.
pub async fn kill_child(task_id: usize, child: &mut AsyncGroupChild) -> io::Result<()> {
    match child.kill().await {
        Ok(_) => Ok(()),
        Err(ref e) if e.kind() == io::ErrorKind::InvalidData => {
            // Process already exited
            info!("Task {task_id} has already finished by itself.");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
