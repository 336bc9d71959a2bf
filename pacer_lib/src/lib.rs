#![doc = include_str!("../README.md")]

pub(crate) mod internal_prelude {
    #![allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

pub mod error;
pub mod log;
mod setting_defaults;
pub mod settings;
pub mod store;
pub mod task;

pub use error::Error;
pub use settings::Settings;
pub use store::Store;
pub use task::{Task, TaskEdit, TaskStatus};

pub mod prelude {
    pub use super::error::Error;
    pub use super::settings::Settings;
    pub use super::store::Store;
    pub use super::task::{Task, TaskEdit, TaskStatus};
}
