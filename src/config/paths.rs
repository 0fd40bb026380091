//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    // Check for explicit override
    if let Ok(dir) = std::env::var("EXECBOX_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // Use XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("execbox"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("execbox"))
                .unwrap_or_else(|| PathBuf::from(".execbox"))
        })
}

/// Get the main configuration file path
pub fn config_path() -> PathBuf {
    // Check for explicit override
    if let Ok(path) = std::env::var("EXECBOX_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        // Just ensure these don't panic
        let _ = config_dir();
        let _ = config_path();
    }
}
