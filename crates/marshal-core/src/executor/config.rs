//! Chunking configuration for the executor

use crate::error::{MarshalError, MarshalResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Chunk size and inter-chunk delay for one bulk concern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of actions launched concurrently
    pub chunk_size: usize,
    /// Pause between consecutive chunks
    #[serde(with = "humantime_serde", default)]
    pub inter_chunk_delay: Duration,
}

impl ExecutorConfig {
    /// Create a config; a chunk size of zero is raised to one
    pub fn new(chunk_size: usize, inter_chunk_delay: Duration) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            inter_chunk_delay,
        }
    }

    pub fn validate(&self) -> MarshalResult<()> {
        if self.chunk_size == 0 {
            return Err(MarshalError::invalid_input_field(
                "chunk size must be at least 1",
                "chunk_size",
            ));
        }
        Ok(())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::new(50, Duration::from_millis(100))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        assert_eq!(ExecutorConfig::new(0, Duration::ZERO).chunk_size, 1);
    }

    #[test]
    fn test_validate_rejects_zero_from_deserialized_config() {
        let config: ExecutorConfig =
            serde_json::from_str(r#"{"chunk_size": 0, "inter_chunk_delay": "1s"}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_humantime_delay() {
        let config: ExecutorConfig =
            serde_json::from_str(r#"{"chunk_size": 75, "inter_chunk_delay": "100ms"}"#).unwrap();
        assert_eq!(config.inter_chunk_delay, Duration::from_millis(100));
        let config: ExecutorConfig = serde_json::from_str(r#"{"chunk_size": 20}"#).unwrap();
        assert_eq!(config.inter_chunk_delay, Duration::ZERO);
    }
}
