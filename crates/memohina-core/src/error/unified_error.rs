//! UnifiedError trait implementation for HinaError

use super::domain::{ExportError, PersistenceError, RemoteStoreError};
use super::types::{HinaError, UnifiedError};

impl UnifiedError for HinaError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "HINA_CONFIG",
            Self::Io { .. } => "HINA_IO",
            Self::Json { .. } => "HINA_JSON",
            Self::Persistence { .. } => "HINA_PERSISTENCE",
            Self::Remote { .. } => "HINA_REMOTE",
            Self::InvalidInput { .. } => "HINA_INVALID_INPUT",
            Self::Other { .. } => "HINA_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. }
            | Self::Io { message, .. }
            | Self::Json { message, .. }
            | Self::Persistence { message, .. }
            | Self::Remote { message, .. }
            | Self::InvalidInput { message, .. }
            | Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. }
            | Self::Io { context, .. }
            | Self::Json { context, .. }
            | Self::Persistence { context, .. }
            | Self::Remote { context, .. }
            | Self::InvalidInput { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote { retryable: true, .. } | Self::Persistence { .. })
    }
}

impl UnifiedError for PersistenceError {
    fn error_code(&self) -> &str {
        "HINA_PERSISTENCE"
    }

    fn message(&self) -> &str {
        match self {
            Self::Io { message, .. } => message,
            Self::Corrupt { message, .. } => message,
            Self::Serialization(_) => "record serialization failed",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

impl UnifiedError for RemoteStoreError {
    fn error_code(&self) -> &str {
        match self {
            Self::Network(_) => "HINA_REMOTE_NETWORK",
            Self::Auth(_) => "HINA_REMOTE_AUTH",
            Self::Quota(_) => "HINA_REMOTE_QUOTA",
            Self::Conflict(_) => "HINA_REMOTE_CONFLICT",
            Self::Rejected { .. } => "HINA_REMOTE_REJECTED",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Network(message)
            | Self::Auth(message)
            | Self::Quota(message)
            | Self::Conflict(message) => message,
            Self::Rejected { message, .. } => message,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Quota(_) | Self::Conflict(_))
    }
}

impl UnifiedError for ExportError {
    fn error_code(&self) -> &str {
        match self {
            Self::NothingToExport => "HINA_NOTHING_TO_EXPORT",
            Self::Persistence(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
            Self::Encode(_) => "HINA_EXPORT_ENCODE",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NothingToExport => "no new records since the last export",
            Self::Persistence(e) => e.message(),
            Self::Remote(e) => e.message(),
            Self::Encode(message) => message,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::NothingToExport | Self::Encode(_) => false,
            Self::Persistence(e) => e.is_retryable(),
            Self::Remote(e) => e.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HinaError::config("bad").error_code(), "HINA_CONFIG");
        assert_eq!(
            ExportError::NothingToExport.error_code(),
            "HINA_NOTHING_TO_EXPORT"
        );
        assert_eq!(
            ExportError::Remote(RemoteStoreError::Auth("denied".into())).error_code(),
            "HINA_REMOTE_AUTH"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(RemoteStoreError::Network("reset".into()).is_retryable());
        assert!(!RemoteStoreError::Auth("expired".into()).is_retryable());
        assert!(!ExportError::NothingToExport.is_retryable());
        assert!(HinaError::remote("timeout", true).is_retryable());
        assert!(!HinaError::invalid_input("empty").is_retryable());
    }

    #[test]
    fn test_context_is_attached() {
        let err = HinaError::persistence("disk full").with_context("flushing user abc");
        assert_eq!(err.context(), Some("flushing user abc"));
        assert_eq!(err.message(), "disk full");
    }
}
