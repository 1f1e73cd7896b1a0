//! Core error types and traits for Memohina

use thiserror::Error;

/// Result type alias for Memohina operations
pub type HinaResult<T> = Result<T, HinaError>;

/// Unified error trait that all Memohina errors implement.
pub trait UnifiedError: std::error::Error + Send + Sync {
    /// Get the error code for programmatic handling
    fn error_code(&self) -> &str;

    /// Get the human-readable error message
    fn message(&self) -> &str;

    /// Get optional context about the error
    fn context(&self) -> Option<&str> {
        None
    }

    /// Check if this error is retryable
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Main error type for Memohina
#[derive(Error, Debug, Clone)]
pub enum HinaError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// IO errors outside the record store
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
        context: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        context: Option<String>,
    },

    /// Local record store failures
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        context: Option<String>,
    },

    /// Remote archive failures
    #[error("Remote store error: {message}")]
    Remote {
        message: String,
        retryable: bool,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
