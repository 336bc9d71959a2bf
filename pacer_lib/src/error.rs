//! Pacer-lib errors.
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Error while building path: {0}")]
    InvalidPath(String),

    #[error("Error while reading configuration:\n{0}")]
    ConfigDeserialization(String),

    /// The task store file exists, but its content couldn't be understood.
    #[error("Malformed task store at line {line}: {reason}")]
    StoreFormat { line: usize, reason: String },

    /// The task store is syntactically fine, but a required entry is missing or invalid.
    #[error("Invalid task store entry '{key}': {reason}")]
    StoreEntry { key: String, reason: String },

    /// A task definition didn't pass validation.
    #[error("Invalid task definition: {0}")]
    InvalidTask(String),

    #[error("Some error occurred. {0}")]
    Generic(String),

    #[error("I/O error while {0}:\n{1}")]
    IoError(String, std::io::Error),

    #[error("Unexpected I/O error:\n{0}")]
    RawIoError(#[from] std::io::Error),

    #[error("I/O error at path {0:?} while {1}:\n{2}")]
    IoPathError(PathBuf, &'static str, std::io::Error),
}
