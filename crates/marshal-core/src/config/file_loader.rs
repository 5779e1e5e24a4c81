//! File-based configuration loading

use super::model::MarshalConfig;
use crate::error::{MarshalError, MarshalResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> MarshalResult<MarshalConfig> {
    if !path.exists() {
        return Ok(MarshalConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        MarshalError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let config: MarshalConfig = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| {
            MarshalError::config_with_context(
                format!("Failed to parse TOML config: {}", e),
                format!("Deserializing TOML configuration from '{}'", path.display()),
            )
        })?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
            MarshalError::config_with_context(
                format!("Failed to parse YAML config: {}", e),
                format!("Deserializing YAML configuration from '{}'", path.display()),
            )
        })?,
        _ => serde_json::from_str(&content).map_err(|e| {
            MarshalError::config_with_context(
                format!("Failed to parse JSON config: {}", e),
                format!("Deserializing JSON configuration from '{}'", path.display()),
            )
        })?,
    };

    Ok(config)
}

/// Write configuration to a file, in the format implied by its extension
pub fn save_to_file(config: &MarshalConfig, path: &Path) -> MarshalResult<()> {
    let content = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::to_string_pretty(config)
            .map_err(|e| MarshalError::config(format!("Failed to encode TOML config: {}", e)))?,
        Some("yaml") | Some("yml") => serde_yaml::to_string(config)
            .map_err(|e| MarshalError::config(format!("Failed to encode YAML config: {}", e)))?,
        _ => serde_json::to_string_pretty(config)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            MarshalError::io_with_path(
                format!("Failed to create config directory: {}", e),
                parent.display().to_string(),
            )
        })?;
    }
    fs::write(path, content).map_err(|e| {
        MarshalError::io_with_path(
            format!("Failed to write config file: {}", e),
            path.display().to_string(),
        )
    })
}
