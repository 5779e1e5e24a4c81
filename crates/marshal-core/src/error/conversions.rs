//! From trait implementations for MarshalError conversions

use super::types::MarshalError;
use crate::elevation::ElevationError;
use crate::remote::RemoteError;

impl From<std::io::Error> for MarshalError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for MarshalError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<RemoteError> for MarshalError {
    fn from(error: RemoteError) -> Self {
        match error {
            RemoteError::NotFound(what) => Self::not_found_resource(what, "platform entity"),
            other => Self::remote(other.to_string()),
        }
    }
}

impl From<ElevationError> for MarshalError {
    fn from(error: ElevationError) -> Self {
        Self::elevation(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnifiedError;

    #[test]
    fn test_remote_not_found_keeps_its_kind() {
        let err = MarshalError::from(RemoteError::NotFound("member 'u9'".to_string()));
        assert!(matches!(
            &err,
            MarshalError::NotFound { resource_type: Some(kind), .. } if kind == "platform entity"
        ));
        assert_eq!(err.message(), "member 'u9'");
        assert!(!err.is_retryable());

        let err = MarshalError::from(RemoteError::Http {
            status: 503,
            message: "unavailable".to_string(),
        });
        assert_eq!(err.error_code(), "MARSHAL_REMOTE");
        assert!(err.is_retryable());
    }
}
