//! Configuration management for Marshal
//!
//! Precedence, lowest first: built-in defaults, the config file (JSON, TOML
//! or YAML), `MARSHAL_*` environment variables. The merged result is
//! validated before use.

mod env_loader;
mod file_loader;
mod logging_config;
mod model;

pub use env_loader::{
    ENV_AUDIT_REASON, ENV_BAN_RETENTION_DAYS, ENV_EVENT_CAPACITY, ENV_LOG_FORMAT, ENV_LOG_LEVEL,
    apply_env_overrides, apply_overrides_with,
};
pub use file_loader::{load_from_file, save_to_file};
pub use logging_config::LoggingConfig;
pub use model::{
    DEFAULT_AUDIT_REASON, ElevationConfig, ExecutorProfiles, MAX_BAN_RETENTION_DAYS, MarshalConfig,
};

use crate::error::MarshalResult;
use std::path::{Path, PathBuf};

/// Default config file name
pub const DEFAULT_CONFIG_FILE: &str = "marshal.toml";

/// `<config dir>/marshal/marshal.toml`, or the file name alone if the
/// platform has no config directory
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("marshal").join(DEFAULT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load, override from the environment and validate
pub fn load_config(path: Option<&Path>) -> MarshalResult<MarshalConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    let mut config = load_from_file(&path)?;
    apply_env_overrides(&mut config)?;
    config.validate()?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}
