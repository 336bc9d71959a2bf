//! This module contains helper functions, which are used by all engine tests.
mod fixtures;

pub use fixtures::*;
#[cfg(target_os = "linux")]
pub use process::*;
pub use wait::*;

/// The global timeout in milliseconds for all polling helpers.
pub const TIMEOUT: u64 = 5000;

/// A helper function to sleep for ms time.
/// Only used to avoid the boilerplate of importing the same stuff all over the place.
pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
}
