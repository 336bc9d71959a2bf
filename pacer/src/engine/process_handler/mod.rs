//! Everything that's related to spawning, supervising and stopping task processes.
use std::process::ExitStatus;

pub mod finish;
pub mod kill;
mod output;
pub mod spawn;

/// What ended the supervision of a process.
#[derive(Debug)]
pub enum ExecutionEnd {
    /// The process exited on its own.
    Exited(ExitStatus),
    /// The process has been stopped, either by a cancellation or by its timeout.
    Aborted,
}
