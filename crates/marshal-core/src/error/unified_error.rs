//! UnifiedError trait implementation for MarshalError

use super::types::{MarshalError, UnifiedError};

impl UnifiedError for MarshalError {
    fn error_code(&self) -> &str {
        match self {
            Self::Config { .. } => "MARSHAL_CONFIG",
            Self::Remote { .. } => "MARSHAL_REMOTE",
            Self::Elevation { .. } => "MARSHAL_ELEVATION",
            Self::SequenceAborted { .. } => "MARSHAL_SEQUENCE_ABORTED",
            Self::InvalidInput { .. } => "MARSHAL_INVALID_INPUT",
            Self::Io { .. } => "MARSHAL_IO",
            Self::Json { .. } => "MARSHAL_JSON",
            Self::NotFound { .. } => "MARSHAL_NOT_FOUND",
            Self::Other { .. } => "MARSHAL_OTHER",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Config { message, .. } => message,
            Self::Remote { message, .. } => message,
            Self::Elevation { message, .. } => message,
            Self::SequenceAborted { reason, .. } => reason,
            Self::InvalidInput { message, .. } => message,
            Self::Io { message, .. } => message,
            Self::Json { message, .. } => message,
            Self::NotFound { message, .. } => message,
            Self::Other { message, .. } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Config { context, .. } => context.as_deref(),
            Self::Remote { context, .. } => context.as_deref(),
            Self::Elevation { context, .. } => context.as_deref(),
            Self::SequenceAborted { context, .. } => context.as_deref(),
            Self::InvalidInput { context, .. } => context.as_deref(),
            Self::Io { context, .. } => context.as_deref(),
            Self::Json { context, .. } => context.as_deref(),
            Self::NotFound { context, .. } => context.as_deref(),
            Self::Other { context, .. } => context.as_deref(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(MarshalError::config("x").error_code(), "MARSHAL_CONFIG");
        assert_eq!(
            MarshalError::sequence_aborted("teardown", "phase failed").error_code(),
            "MARSHAL_SEQUENCE_ABORTED"
        );
        assert_eq!(MarshalError::elevation("x").error_code(), "MARSHAL_ELEVATION");
    }

    #[test]
    fn test_with_context_sets_context() {
        let err = MarshalError::invalid_input_field("chunk size must be positive", "chunk_size")
            .with_context("validating executor config");
        assert_eq!(err.context(), Some("validating executor config"));
        assert_eq!(err.message(), "chunk size must be positive");
    }

    #[test]
    fn test_only_remote_errors_are_retryable() {
        assert!(MarshalError::remote("rate limited").is_retryable());
        assert!(!MarshalError::config("bad").is_retryable());
        assert!(!MarshalError::sequence_aborted("s", "r").is_retryable());
    }

    #[test]
    fn test_sequence_aborted_display() {
        let err = MarshalError::sequence_aborted("teardown", "phase 'strip-groupings' had no successes");
        assert_eq!(
            err.to_string(),
            "Sequence 'teardown' aborted: phase 'strip-groupings' had no successes"
        );
    }
}
