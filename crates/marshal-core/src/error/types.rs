//! Core error types and traits for Marshal

use thiserror::Error;

/// Result type alias for Marshal operations
pub type MarshalResult<T> = Result<T, MarshalError>;

/// Unified error trait that all Marshal errors implement.
///
/// - error_code(): Unique code for programmatic error identification
/// - message(): Human-readable error message
/// - context(): Optional additional context
/// - is_retryable(): Whether re-submitting the same request may succeed
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

/// Main error type for Marshal
#[derive(Error, Debug, Clone)]
pub enum MarshalError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// A remote platform call failed outside of a per-target action
    #[error("Remote error: {message}")]
    Remote {
        message: String,
        context: Option<String>,
    },

    /// Every elevation strategy was exhausted
    #[error("Elevation failed: {message}")]
    Elevation {
        message: String,
        context: Option<String>,
    },

    /// A phase sequence stopped before its last phase
    #[error("Sequence '{sequence}' aborted: {reason}")]
    SequenceAborted {
        sequence: String,
        reason: String,
        context: Option<String>,
    },

    /// Invalid input errors
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: Option<String>,
    },

    /// IO errors
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

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        resource_type: Option<String>,
        context: Option<String>,
    },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}
