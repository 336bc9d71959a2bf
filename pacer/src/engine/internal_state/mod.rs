use std::sync::MutexGuard;

/// The table of all currently supervised executions.
pub mod executions;
/// The main struct used to represent the engine's current state.
pub mod state;

pub type LockedState<'a> = MutexGuard<'a, state::InternalState>;
