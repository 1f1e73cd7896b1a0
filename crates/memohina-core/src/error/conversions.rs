//! Conversions from standard and component errors into HinaError

use super::domain::{ExportError, PersistenceError, RemoteStoreError};
use super::types::{HinaError, UnifiedError};

impl From<std::io::Error> for HinaError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_json::Error> for HinaError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

impl From<PersistenceError> for HinaError {
    fn from(err: PersistenceError) -> Self {
        match &err {
            PersistenceError::Io { path, .. } | PersistenceError::Corrupt { path, .. } => {
                Self::persistence(err.to_string()).with_context(path.display().to_string())
            }
            PersistenceError::Serialization(_) => Self::persistence(err.to_string()),
        }
    }
}

impl From<RemoteStoreError> for HinaError {
    fn from(err: RemoteStoreError) -> Self {
        let retryable = err.is_retryable();
        Self::remote(err.to_string(), retryable)
    }
}

impl From<ExportError> for HinaError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NothingToExport => Self::other("nothing to export"),
            ExportError::Persistence(e) => e.into(),
            ExportError::Remote(e) => e.into(),
            ExportError::Encode(message) => Self::json(message),
        }
    }
}
