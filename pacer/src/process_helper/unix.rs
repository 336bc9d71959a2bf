use std::io;

use nix::{
    errno::Errno,
    sys::signal::{killpg, Signal},
    unistd::Pid,
};
use pacer_lib::Settings;

use crate::internal_prelude::*;

pub fn get_shell_command(settings: &Settings) -> Vec<String> {
    let Some(ref shell_command) = settings.engine.shell_command else {
        return vec![
            "sh".into(),
            "-c".into(),
            "{{ pacer_command_string }}".into(),
        ];
    };

    shell_command.clone()
}

/// Ask a whole process group to terminate via SIGTERM.
///
/// Processes are spawned as group leaders, which is why the pid doubles as the group id.
pub fn terminate_process_tree(pid: u32) -> io::Result<()> {
    signal_process_group(pid, Signal::SIGTERM)
}

/// Forcefully kill a whole process group via SIGKILL.
pub fn kill_process_tree(pid: u32) -> io::Result<()> {
    signal_process_group(pid, Signal::SIGKILL)
}

fn signal_process_group(pid: u32, signal: Signal) -> io::Result<()> {
    let pgid = i32::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    match killpg(Pid::from_raw(pgid), signal) {
        Ok(()) => Ok(()),
        // The group is already gone.
        Err(Errno::ESRCH) => {
            debug!("Process group {pgid} no longer exists, skipping {signal}");
            Ok(())
        }
        Err(errno) => Err(errno.into()),
    }
}
