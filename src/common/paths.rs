use anyhow::{Context, Result};
use std::path::PathBuf;

/// Get the realign config directory
pub fn realign_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("realign");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

pub fn default_config_file() -> Result<PathBuf> {
    Ok(realign_config_dir()?.join("config.toml"))
}
