use std::{io, process::Command};

use pacer_lib::Settings;

use crate::internal_prelude::*;

pub fn get_shell_command(settings: &Settings) -> Vec<String> {
    let Some(ref shell_command) = settings.engine.shell_command else {
        return vec!["cmd".into(), "/C".into(), "{{ pacer_command_string }}".into()];
    };

    shell_command.clone()
}

/// Windows has no graceful termination for process trees.
/// `taskkill /T /F` forcefully kills the process and all of its descendants.
pub fn terminate_process_tree(pid: u32) -> io::Result<()> {
    kill_process_tree(pid)
}

pub fn kill_process_tree(pid: u32) -> io::Result<()> {
    let output = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .output()?;

    if !output.status.success() {
        // Exit code 128: the process couldn't be found, it already went away.
        if output.status.code() == Some(128) {
            debug!("Process {pid} no longer exists, nothing to kill");
            return Ok(());
        }

        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "taskkill failed for process {pid}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    Ok(())
}
