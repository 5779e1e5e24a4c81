//! Environment variable overrides
//!
//! Variables carry the `MARSHAL_` prefix. Lookup goes through a closure so
//! callers (and tests) can supply their own environment.

use super::model::MarshalConfig;
use crate::error::{MarshalError, MarshalResult};
use std::str::FromStr;

pub const ENV_LOG_LEVEL: &str = "MARSHAL_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "MARSHAL_LOG_FORMAT";
pub const ENV_BAN_RETENTION_DAYS: &str = "MARSHAL_BAN_RETENTION_DAYS";
pub const ENV_EVENT_CAPACITY: &str = "MARSHAL_EVENT_CAPACITY";
pub const ENV_AUDIT_REASON: &str = "MARSHAL_AUDIT_REASON";

/// Apply overrides from the process environment
pub fn apply_env_overrides(config: &mut MarshalConfig) -> MarshalResult<()> {
    apply_overrides_with(config, |key| std::env::var(key).ok())
}

/// Apply overrides using `lookup` to read variables
pub fn apply_overrides_with<F>(config: &mut MarshalConfig, lookup: F) -> MarshalResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = lookup(ENV_LOG_FORMAT) {
        config.logging.format = format;
    }
    if let Some(reason) = lookup(ENV_AUDIT_REASON) {
        config.audit_reason = reason;
    }
    if let Some(days) = lookup(ENV_BAN_RETENTION_DAYS) {
        config.ban_retention_days = parse(ENV_BAN_RETENTION_DAYS, &days)?;
    }
    if let Some(capacity) = lookup(ENV_EVENT_CAPACITY) {
        config.event_capacity = parse(ENV_EVENT_CAPACITY, &capacity)?;
    }
    Ok(())
}

fn parse<T: FromStr>(key: &str, value: &str) -> MarshalResult<T> {
    value.trim().parse().map_err(|_| {
        MarshalError::config_with_context(
            format!("Invalid {} value", key),
            format!("Parsing environment value '{}'", value),
        )
    })
}
