//! The `pacer` command line front-end.
//!
//! It drives an in-process [crate::engine::Engine] and renders its snapshots.
pub mod cli;
/// All subcommands have their dedicated file and functions in here.
mod commands;
/// Table and detail views of tasks.
mod display;
/// The [`OutputStyle`] helper, responsible for styling output depending on the color settings.
mod style;

pub use commands::handle_command;
pub use style::OutputStyle;
