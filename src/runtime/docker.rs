//! Docker-backed container runtime
//!
//! Drives ephemeral execution containers through the local Docker daemon.
//! Containers are created with `auto_remove` off so logs stay readable after
//! exit; removal is always an explicit step.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogOutput, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::Docker;
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::{ContainerRuntime, ContainerSpec};

/// Container runtime backed by the local Docker daemon
#[derive(Clone)]
pub struct DockerRuntime {
    /// Docker client
    docker: Docker,
}

impl DockerRuntime {
    /// Connect to the local Docker daemon and verify it responds
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::Runtime(format!("Failed to connect to Docker: {}", e)))?;

        docker
            .ping()
            .await
            .map_err(|e| Error::Runtime(format!("Docker ping failed: {}", e)))?;

        info!("Connected to Docker daemon");

        Ok(DockerRuntime { docker })
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }

    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.docker.inspect_image(image).await.is_ok() {
            debug!("Image already present: {}", image);
            return Ok(());
        }

        info!("Pulling image: {}", image);

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(progress) => {
                    if let Some(status) = progress.status {
                        debug!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(Error::Runtime(format!("Failed to pull image: {}", e)));
                }
            }
        }

        info!("Image pulled: {}", image);
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> Result<String> {
        let name = format!("execbox-{}", uuid::Uuid::new_v4());

        let binds: Vec<String> = spec.binds.iter().map(|b| b.to_bind_arg()).collect();

        let container_config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            network_disabled: Some(spec.network_disabled()),
            host_config: Some(bollard::service::HostConfig {
                memory: spec.memory_bytes,
                cpu_period: spec.cpu_period,
                cpu_quota: spec.cpu_quota,
                binds: if binds.is_empty() { None } else { Some(binds) },
                network_mode: Some(spec.network.clone()),
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let create_options = CreateContainerOptions {
            name: &name,
            platform: None,
        };

        self.docker
            .create_container(Some(create_options), container_config)
            .await
            .map_err(|e| Error::Runtime(format!("Failed to create container: {}", e)))?;

        debug!("Created container: {}", name);
        Ok(name)
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Runtime(format!("Failed to start container: {}", e)))?;
        Ok(())
    }

    async fn wait(&self, id: &str) -> Result<i64> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(id, Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard surfaces non-zero exit statuses as this error variant
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(Error::Runtime(format!("Wait failed: {}", e))),
            None => Err(Error::Runtime("Container wait stream ended".to_string())),
        }
    }

    async fn logs(&self, id: &str) -> Result<Vec<u8>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut combined = Vec::new();

        while let Some(result) = stream.next().await {
            match result {
                Ok(LogOutput::StdOut { message }) | Ok(LogOutput::StdErr { message }) => {
                    combined.extend_from_slice(&message);
                }
                Err(e) => {
                    warn!("Error reading logs: {}", e);
                }
                _ => {}
            }
        }

        Ok(combined)
    }

    async fn kill(&self, id: &str) -> Result<()> {
        self.docker
            .kill_container(id, None::<KillContainerOptions<String>>)
            .await
            .map_err(|e| Error::Runtime(format!("Failed to kill container: {}", e)))?;

        debug!("Killed container: {}", id);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };

        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| Error::Runtime(format!("Failed to remove container: {}", e)))?;

        debug!("Removed container: {}", id);
        Ok(())
    }
}
