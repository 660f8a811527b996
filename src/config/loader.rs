//! Config file loader and serialization.

use crate::config::BootstrapConfig;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the per-user config path: ~/.config/devbox-bootstrap/config.toml
pub fn get_global_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine config directory".to_string())
    })?;

    Ok(config_dir.join("devbox-bootstrap").join("config.toml"))
}

/// Load config from a TOML file.
pub fn load_config_from_file(path: &Path) -> Result<BootstrapConfig, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let config: BootstrapConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save config to a TOML file.
pub fn save_config_to_file(config: &BootstrapConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;

    Ok(())
}

/// Load an explicit config file, else the per-user file if it exists, else defaults.
///
/// An explicit path that does not exist is an error; a missing per-user file is not.
pub fn load_or_default(explicit: Option<&Path>) -> Result<BootstrapConfig, ConfigError> {
    if let Some(path) = explicit {
        log::info!("[Config] Loading configuration from {}", path.display());
        return load_config_from_file(path);
    }

    match get_global_config_path() {
        Ok(path) if path.exists() => {
            log::info!("[Config] Loading configuration from {}", path.display());
            load_config_from_file(&path)
        }
        _ => {
            log::debug!("[Config] No config file found, using built-in defaults");
            Ok(BootstrapConfig::default())
        }
    }
}

/// Validate config path (.toml extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml extension".to_string(),
        )),
    }
}
