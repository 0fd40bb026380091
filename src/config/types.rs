//! Configuration types
//!
//! Defaults mirror the execution image contract: 512 MiB of memory, half of
//! one CPU core, no network, 30 second wall-clock limit.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Execution container configuration
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            executor: ExecutorConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Execution container configuration
///
/// The image is an explicit setting rather than a constant baked into the
/// shim; it must already contain the interpreter and any libraries the
/// executed code expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Docker image execution containers are launched from
    #[serde(default = "default_image")]
    pub image: String,
    /// Directory inside the container where the scratch directory is mounted
    #[serde(default = "default_mount_point")]
    pub mount_point: String,
    /// Memory limit (e.g. "512m", "1g")
    #[serde(default = "default_memory")]
    pub memory_limit: String,
    /// CPU scheduler period in microseconds
    #[serde(default = "default_cpu_period")]
    pub cpu_period: i64,
    /// CPU quota per period in microseconds (50000/100000 = half a core)
    #[serde(default = "default_cpu_quota")]
    pub cpu_quota: i64,
    /// Network mode ("none" disables network access entirely)
    #[serde(default = "default_network")]
    pub network: String,
    /// Maximum execution time in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            image: default_image(),
            mount_point: default_mount_point(),
            memory_limit: default_memory(),
            cpu_period: default_cpu_period(),
            cpu_quota: default_cpu_quota(),
            network: default_network(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ExecutorConfig {
    /// Wall-clock limit as a [`Duration`] (configured in milliseconds)
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether container network access is disabled
    pub fn network_disabled(&self) -> bool {
        self.network == "none"
    }
}

fn default_image() -> String {
    "execbox-runner:latest".to_string()
}

fn default_mount_point() -> String {
    "/app/code".to_string()
}

fn default_memory() -> String {
    "512m".to_string()
}

fn default_cpu_period() -> i64 {
    100_000
}

fn default_cpu_quota() -> i64 {
    50_000
}

fn default_network() -> String {
    "none".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_config_defaults() {
        let config = ExecutorConfig::default();
        assert_eq!(config.image, "execbox-runner:latest");
        assert_eq!(config.mount_point, "/app/code");
        assert_eq!(config.memory_limit, "512m");
        assert_eq!(config.cpu_period, 100_000);
        assert_eq!(config.cpu_quota, 50_000);
        assert_eq!(config.timeout_ms, 30_000);
        assert!(config.network_disabled());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_file_is_a_valid_config() {
        let config: Config = json5::from_str("{}").unwrap();
        assert_eq!(config.executor.image, ExecutorConfig::default().image);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_network_modes() {
        let mut config = ExecutorConfig::default();
        assert!(config.network_disabled());
        config.network = "bridge".to_string();
        assert!(!config.network_disabled());
    }
}
