//! Storage-specific error types for the JSON store.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tickerbook_core::errors::Error;

/// Errors raised while writing records.
///
/// These are internal to the storage layer and are converted to
/// `tickerbook_core::Error` before being returned to callers.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to replace {path}: {source}")]
    Rename { path: PathBuf, source: io::Error },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => Error::Serialization(e),
            other => Error::Storage(other.to_string()),
        }
    }
}
