//! Configuration model

use super::logging_config::LoggingConfig;
use crate::elevation::{DEFAULT_GROUPING_NAME, ElevationResolver, ElevationStrategy};
use crate::error::{MarshalError, MarshalResult};
use crate::executor::ExecutorConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum message retention a ban may delete
pub const MAX_BAN_RETENTION_DAYS: u8 = 7;

/// Default audit reason template; `{workflow}` and `{invoker}` are substituted
pub const DEFAULT_AUDIT_REASON: &str = "{workflow} requested by {invoker}";

/// Chunking per bulk concern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorProfiles {
    pub removal: ExecutorConfig,
    pub ban: ExecutorConfig,
    /// Bans issued as part of a teardown
    pub teardown_ban: ExecutorConfig,
    pub grouping: ExecutorConfig,
    pub channel: ExecutorConfig,
    pub message: ExecutorConfig,
}

impl Default for ExecutorProfiles {
    fn default() -> Self {
        Self {
            removal: ExecutorConfig::new(100, Duration::from_millis(100)),
            ban: ExecutorConfig::new(50, Duration::from_millis(200)),
            teardown_ban: ExecutorConfig::new(75, Duration::from_millis(100)),
            grouping: ExecutorConfig::new(25, Duration::ZERO),
            channel: ExecutorConfig::new(20, Duration::from_millis(200)),
            message: ExecutorConfig::new(25, Duration::from_secs(1)),
        }
    }
}

impl ExecutorProfiles {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &ExecutorConfig)> {
        [
            ("removal", &self.removal),
            ("ban", &self.ban),
            ("teardown_ban", &self.teardown_ban),
            ("grouping", &self.grouping),
            ("channel", &self.channel),
            ("message", &self.message),
        ]
        .into_iter()
    }
}

/// Elevation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Strategies in the order they are tried
    pub strategies: Vec<ElevationStrategy>,
    /// Name of a grouping created for the acting identity
    pub grouping_name: String,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            strategies: ElevationStrategy::DEFAULT_ORDER.to_vec(),
            grouping_name: DEFAULT_GROUPING_NAME.to_string(),
        }
    }
}

impl ElevationConfig {
    pub fn resolver(&self) -> ElevationResolver {
        ElevationResolver::new(self.strategies.clone()).with_grouping_name(self.grouping_name.clone())
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarshalConfig {
    /// Days of a banned member's messages to delete
    pub ban_retention_days: u8,
    pub audit_reason: String,
    /// Buffered status events per subscriber
    pub event_capacity: usize,
    pub executors: ExecutorProfiles,
    pub elevation: ElevationConfig,
    pub logging: LoggingConfig,
}

impl Default for MarshalConfig {
    fn default() -> Self {
        Self {
            ban_retention_days: MAX_BAN_RETENTION_DAYS,
            audit_reason: DEFAULT_AUDIT_REASON.to_string(),
            event_capacity: 256,
            executors: ExecutorProfiles::default(),
            elevation: ElevationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl MarshalConfig {
    /// Render the audit reason for one workflow invocation
    pub fn audit_reason(&self, workflow: &str, invoker: &str) -> String {
        self.audit_reason
            .replace("{workflow}", workflow)
            .replace("{invoker}", invoker)
    }

    pub fn validate(&self) -> MarshalResult<()> {
        for (concern, executor) in self.executors.iter() {
            executor
                .validate()
                .map_err(|e| e.with_context(format!("Validating executor profile '{}'", concern)))?;
        }
        if self.ban_retention_days > MAX_BAN_RETENTION_DAYS {
            return Err(MarshalError::config(format!(
                "ban_retention_days must be at most {}, got {}",
                MAX_BAN_RETENTION_DAYS, self.ban_retention_days
            )));
        }
        if self.event_capacity == 0 {
            return Err(MarshalError::config("event_capacity must be at least 1"));
        }
        if self.elevation.strategies.is_empty() {
            return Err(MarshalError::config(
                "at least one elevation strategy must be configured",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MarshalConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.executors.removal.chunk_size, 100);
        assert_eq!(config.executors.message.inter_chunk_delay, Duration::from_secs(1));
        assert_eq!(config.ban_retention_days, 7);
    }

    #[test]
    fn test_audit_reason_template() {
        let config = MarshalConfig::default();
        assert_eq!(
            config.audit_reason("teardown", "alice"),
            "teardown requested by alice"
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MarshalConfig::default();
        config.ban_retention_days = 8;
        assert!(config.validate().is_err());

        let mut config = MarshalConfig::default();
        config.executors.channel.chunk_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk size"));

        let mut config = MarshalConfig::default();
        config.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: MarshalConfig = serde_json::from_str(
            r#"{"executors": {"ban": {"chunk_size": 10, "inter_chunk_delay": "2s"}}}"#,
        )
        .unwrap();
        assert_eq!(config.executors.ban.chunk_size, 10);
        assert_eq!(config.executors.ban.inter_chunk_delay, Duration::from_secs(2));
        assert_eq!(config.executors.removal.chunk_size, 100);
        assert_eq!(config.audit_reason, DEFAULT_AUDIT_REASON);
    }
}
