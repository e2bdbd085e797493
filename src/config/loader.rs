// Configuration loader
// Loads router settings from $INTENT_ROUTER_CONFIG or ~/.intent-router/config.toml

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{CONFIG_DIR_NAME, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use super::settings::RouterConfig;

/// Load configuration.
///
/// An explicit `$INTENT_ROUTER_CONFIG` must exist. Without it the home
/// config file is optional and a missing one means defaults.
pub fn load_config() -> Result<RouterConfig> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return load_config_from(Path::new(&path));
        }
    }

    match default_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => {
            tracing::debug!("No config file found, using defaults");
            Ok(RouterConfig::default())
        }
    }
}

/// Load and validate a specific TOML file.
pub fn load_config_from(path: &Path) -> Result<RouterConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: RouterConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    tracing::info!("Loaded router config from {}", path.display());
    Ok(config)
}

/// `~/.intent-router/config.toml`, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
