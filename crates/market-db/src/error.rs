//! Snapshot store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing a snapshot file.
#[derive(Error, Debug)]
pub enum DbError {
    /// The data directory could not be prepared.
    #[error("Failed to open database at {path}: {source}")]
    OpenError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the snapshot file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store lock could not be taken.
    #[error("Failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(String),

    /// The file exists but does not hold the expected document.
    #[error("Deserialization error: {0}")]
    DeserializeError(String),
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        DbError::DeserializeError(e.to_string())
    }
}
