mod duplicate;
mod registry;
mod remove;
/// Tests regarding task restoration from a previous run.
mod restore;
mod run;
mod scheduler;
/// Tests for shutting down the engine.
mod shutdown;
