//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::Path;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.json) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env for convenience)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    // Apply environment variable overrides (highest precedence)
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
        // Parse as JSON5 (more lenient than strict JSON)
        json5::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try JSON5 first, then TOML
        json5::from_str(&content)
            .or_else(|_| toml::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// This loads `.env` if present and overlays any set environment variables
/// onto the config. Env vars have the highest precedence in the config
/// layering: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Executor overrides
    if let Ok(image) = std::env::var("EXECBOX_IMAGE") {
        config.executor.image = image;
    }
    if let Ok(timeout) = std::env::var("EXECBOX_MAX_EXECUTION_TIME") {
        if let Ok(v) = timeout.parse() {
            config.executor.timeout_ms = v;
        }
    }
    if let Ok(memory) = std::env::var("EXECBOX_MEMORY_LIMIT") {
        config.executor.memory_limit = memory;
    }
    if let Ok(network) = std::env::var("EXECBOX_NETWORK") {
        config.executor.network = network;
    }
    if let Ok(mount) = std::env::var("EXECBOX_MOUNT_POINT") {
        config.executor.mount_point = mount;
    }

    // Server overrides
    if let Ok(bind) = std::env::var("EXECBOX_SERVER_BIND") {
        config.server.bind = bind;
    }
    if let Ok(port) = std::env::var("EXECBOX_SERVER_PORT") {
        if let Ok(v) = port.parse() {
            config.server.port = v;
        }
    }
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}
