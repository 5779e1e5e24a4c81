//! `marshal config`

use crate::console::CliConsole;
use anyhow::bail;
use marshal_core::MarshalConfig;
use marshal_core::config::{default_config_path, save_to_file};
use std::path::Path;

/// Print the effective configuration as TOML
pub fn show(config: &MarshalConfig, source: &Path) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    console.print_header("Configuration");
    if source.exists() {
        console.success(&format!("Loaded configuration from: {}", source.display()));
    } else {
        console.info(&format!(
            "{} not found, showing defaults with environment overrides",
            source.display()
        ));
    }
    println!();
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Write a configuration file with defaults
pub fn init(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let console = CliConsole::new(true);
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

    if path.exists() && !force {
        bail!(
            "configuration file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    save_to_file(&MarshalConfig::default(), &path)?;
    console.success(&format!("Created configuration file: {}", path.display()));
    Ok(())
}
