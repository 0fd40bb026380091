//! Container runtime abstraction
//!
//! The execution service drives containers through the [`ContainerRuntime`]
//! trait, one verb per daemon round trip. Production uses [`DockerRuntime`];
//! tests substitute an in-memory runtime.

mod docker;

pub use docker::DockerRuntime;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::ExecutorConfig;
use crate::error::Result;

/// Low-level container operations against a runtime daemon
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Check that the daemon responds
    async fn ping(&self) -> Result<()>;

    /// Make sure an image is available locally, pulling it if needed
    async fn ensure_image(&self, image: &str) -> Result<()>;

    /// Create a container and return its handle
    async fn create(&self, spec: &ContainerSpec) -> Result<String>;

    /// Start a created container
    async fn start(&self, id: &str) -> Result<()>;

    /// Block until the container stops and return its exit code
    async fn wait(&self, id: &str) -> Result<i64>;

    /// Collect stdout and stderr, interleaved in arrival order
    async fn logs(&self, id: &str) -> Result<Vec<u8>>;

    /// Forcibly terminate a running container
    async fn kill(&self, id: &str) -> Result<()>;

    /// Remove a container, force-killing it if still running
    async fn remove(&self, id: &str) -> Result<()>;
}

/// Everything needed to create an execution container
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    /// Image tag to run
    pub image: String,
    /// Command to execute
    pub cmd: Vec<String>,
    /// Host directories mounted into the container
    pub binds: Vec<BindMount>,
    /// Memory limit in bytes
    pub memory_bytes: Option<i64>,
    /// CFS scheduler period in microseconds
    pub cpu_period: Option<i64>,
    /// CFS runtime quota per period in microseconds
    pub cpu_quota: Option<i64>,
    /// Network mode; "none" disables networking entirely
    pub network: String,
}

impl ContainerSpec {
    /// Build a spec from executor settings and a command
    pub fn from_executor(config: &ExecutorConfig, cmd: Vec<String>) -> Self {
        ContainerSpec {
            image: config.image.clone(),
            cmd,
            binds: Vec::new(),
            memory_bytes: parse_memory_limit(&config.memory_limit),
            cpu_period: Some(config.cpu_period),
            cpu_quota: Some(config.cpu_quota),
            network: config.network.clone(),
        }
    }

    /// Attach a bind mount
    pub fn with_bind(mut self, bind: BindMount) -> Self {
        self.binds.push(bind);
        self
    }

    /// Whether the container runs without network access
    pub fn network_disabled(&self) -> bool {
        self.network == "none"
    }
}

/// A host directory mounted into the container
#[derive(Debug, Clone)]
pub struct BindMount {
    /// Host path
    pub host: PathBuf,
    /// Path inside the container
    pub container: String,
    /// Mount read-only
    pub read_only: bool,
}

impl BindMount {
    /// Create a read-only mount
    pub fn read_only(host: impl Into<PathBuf>, container: impl Into<String>) -> Self {
        BindMount {
            host: host.into(),
            container: container.into(),
            read_only: true,
        }
    }

    /// Render as a Docker bind argument (`host:container[:ro]`)
    pub fn to_bind_arg(&self) -> String {
        let mode = if self.read_only { ":ro" } else { "" };
        format!("{}:{}{}", self.host.display(), self.container, mode)
    }
}

/// Parse a memory limit string (e.g., "512m", "1g") to bytes
pub fn parse_memory_limit(limit: &str) -> Option<i64> {
    let limit = limit.to_lowercase();
    let (num_str, unit) = if limit.ends_with("g") || limit.ends_with("gb") {
        (limit.trim_end_matches(|c| c == 'g' || c == 'b'), "g")
    } else if limit.ends_with("m") || limit.ends_with("mb") {
        (limit.trim_end_matches(|c| c == 'm' || c == 'b'), "m")
    } else if limit.ends_with("k") || limit.ends_with("kb") {
        (limit.trim_end_matches(|c| c == 'k' || c == 'b'), "k")
    } else {
        (limit.as_str(), "b")
    };

    let num: i64 = num_str.parse().ok()?;

    Some(match unit {
        "g" => num * 1024 * 1024 * 1024,
        "m" => num * 1024 * 1024,
        "k" => num * 1024,
        _ => num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(parse_memory_limit("512m"), Some(512 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1g"), Some(1024 * 1024 * 1024));
        assert_eq!(parse_memory_limit("1024k"), Some(1024 * 1024));
        assert_eq!(parse_memory_limit("1024"), Some(1024));
        assert_eq!(parse_memory_limit("lots"), None);
    }

    #[test]
    fn test_bind_arg_rendering() {
        let bind = BindMount::read_only("/tmp/scratch", "/app/code");
        assert_eq!(bind.to_bind_arg(), "/tmp/scratch:/app/code:ro");

        let rw = BindMount {
            host: PathBuf::from("/data"),
            container: "/data".to_string(),
            read_only: false,
        };
        assert_eq!(rw.to_bind_arg(), "/data:/data");
    }

    #[test]
    fn test_spec_from_executor_defaults() {
        let config = ExecutorConfig::default();
        let spec = ContainerSpec::from_executor(&config, vec!["python".to_string()]);

        assert_eq!(spec.image, config.image);
        assert_eq!(spec.memory_bytes, Some(512 * 1024 * 1024));
        assert_eq!(spec.cpu_period, Some(100_000));
        assert_eq!(spec.cpu_quota, Some(50_000));
        assert!(spec.network_disabled());
        assert!(spec.binds.is_empty());
    }
}
