//! Sandboxed code execution
//!
//! One ephemeral container per call: code is staged into a scratch
//! directory, bind-mounted read-only into a resource-capped,
//! network-disabled container, run under a wall-clock limit, and the
//! container is removed afterwards on every path.

mod service;
mod types;

pub use service::ExecutionService;
pub use types::{ExecutionRequest, ExecutionResult, Language, PackageInfo, PackageListResult};

use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::error::Result;
use crate::runtime::{ContainerRuntime, DockerRuntime};

/// Connect to the local container runtime and build an execution service
///
/// Verifies the daemon responds and pulls the configured image if absent.
pub async fn connect(config: &ExecutorConfig) -> Result<ExecutionService> {
    let runtime = DockerRuntime::connect().await?;
    runtime.ensure_image(&config.image).await?;

    Ok(ExecutionService::new(Arc::new(runtime), config.clone()))
}
