//! Component-level errors for the record store, remote archive and exporter

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Local record store failure.
///
/// Never fatal to the in-memory fast paths: the latest-record view is updated
/// before any disk work, and unflushed records stay buffered for the next flush.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("{message}")]
    Io {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Corrupt { message: String, path: PathBuf },

    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PersistenceError {
    /// Wrap an IO error with the action and path it happened on
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            message: format!("failed to {} {}: {}", action, path.display(), source),
            path: path.to_path_buf(),
            source,
        }
    }

    /// A file exists but its content cannot be used
    pub fn corrupt(path: &Path, message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
            path: path.to_path_buf(),
        }
    }
}

/// Failure of the remote `put(key, bytes) -> url` capability
#[derive(Debug, Error)]
pub enum RemoteStoreError {
    #[error("network failure: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    /// The key already exists; snapshots are never overwritten
    #[error("object already exists: {0}")]
    Conflict(String),

    #[error("remote rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Outcome of a failed incremental export
#[derive(Debug, Error)]
pub enum ExportError {
    /// No records after the cursor; an informational no-op for the caller
    #[error("nothing to export")]
    NothingToExport,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Remote(#[from] RemoteStoreError),

    #[error("failed to encode snapshot: {0}")]
    Encode(String),
}
