//! Execution service
//!
//! Drives one ephemeral container per call through a [`ContainerRuntime`].
//! The container handle is a local of the running call, never service
//! state, so a shared instance can serve concurrent executions. Once a
//! container has been created it is removed exactly once, whatever the
//! outcome of the run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::ExecutorConfig;
use crate::error::{Error, Result};
use crate::runtime::{BindMount, ContainerRuntime, ContainerSpec};

use super::types::{ExecutionRequest, ExecutionResult, Language, PackageInfo, PackageListResult};

/// Command that prints the image's package manifest as JSON
const MANIFEST_CMD: &[&str] = &["pip", "list", "--format=json"];

/// Sandboxed code execution service
#[derive(Clone)]
pub struct ExecutionService {
    /// Container runtime client
    runtime: Arc<dyn ContainerRuntime>,
    /// Executor settings
    config: ExecutorConfig,
}

impl ExecutionService {
    /// Create a service on top of a runtime client
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: ExecutorConfig) -> Self {
        ExecutionService { runtime, config }
    }

    /// Executor settings in effect
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Probe the underlying runtime
    pub async fn ping(&self) -> Result<()> {
        self.runtime.ping().await
    }

    /// Execute code, always producing a result shape
    ///
    /// Nothing escapes this boundary as an error. Callers that want to
    /// branch on failure kinds use [`ExecutionService::run`] instead.
    pub async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        match self.run(request).await {
            Ok(output) => ExecutionResult::success(output),
            Err(e) => {
                if !e.is_execution_failure() {
                    warn!("Execution error: {}", e);
                }
                ExecutionResult::from(e)
            }
        }
    }

    /// Execute code, reporting failures as typed errors
    pub async fn run(&self, request: &ExecutionRequest) -> Result<String> {
        let start = Instant::now();
        debug!(
            "Executing {} snippet ({} bytes)",
            request.language,
            request.code.len()
        );

        let scratch = Scratch::stage(&request.code, request.language).await?;

        let mount_point = &self.config.mount_point;
        let cmd = vec![
            request.language.interpreter().to_string(),
            format!("{}/{}", mount_point, request.language.source_file()),
        ];

        let spec = ContainerSpec::from_executor(&self.config, cmd)
            .with_bind(BindMount::read_only(scratch.path(), mount_point));

        let output = self.run_in_container(&spec).await?;

        debug!("Execution finished in {:?}", start.elapsed());
        Ok(output)
    }

    /// Query the execution image's package manifest, always producing a
    /// result shape
    pub async fn list_packages(&self) -> PackageListResult {
        match self.query_packages().await {
            Ok(packages) => PackageListResult::success(packages),
            Err(e) => {
                if !e.is_execution_failure() {
                    warn!("Package query error: {}", e);
                }
                PackageListResult::from(e)
            }
        }
    }

    /// Query the package manifest, reporting failures as typed errors
    ///
    /// Runs under the same image, resource caps, and wall-clock limit as
    /// code execution, with no mounts.
    pub async fn query_packages(&self) -> Result<Vec<PackageInfo>> {
        let cmd = MANIFEST_CMD.iter().map(|s| s.to_string()).collect();
        let spec = ContainerSpec::from_executor(&self.config, cmd);

        let output = self.run_in_container(&spec).await?;
        let packages: Vec<PackageInfo> = serde_json::from_str(output.trim())?;

        Ok(packages)
    }

    /// Create, drive, and tear down one container, returning decoded output
    ///
    /// Removal runs exactly once on every path after a successful create.
    /// A failed removal is logged and does not mask the run's outcome.
    async fn run_in_container(&self, spec: &ContainerSpec) -> Result<String> {
        let id = self.runtime.create(spec).await?;

        let outcome = self.drive_container(&id).await;

        if let Err(e) = self.runtime.remove(&id).await {
            warn!("Failed to remove container {}: {}", id, e);
        }

        outcome
    }

    /// Start the container, wait under the configured limit, decode logs
    async fn drive_container(&self, id: &str) -> Result<String> {
        self.runtime.start(id).await?;

        match tokio::time::timeout(self.config.timeout(), self.runtime.wait(id)).await {
            Ok(wait) => {
                let code = wait?;
                let raw = self.runtime.logs(id).await?;
                let output = String::from_utf8(raw)?;

                if code == 0 {
                    Ok(output)
                } else {
                    Err(Error::NonZeroExit { code, output })
                }
            }
            Err(_) => {
                warn!("Execution timed out, killing container {}", id);
                // the container may have exited in the race window
                if let Err(e) = self.runtime.kill(id).await {
                    debug!("Kill after timeout failed: {}", e);
                }
                Err(Error::Timeout)
            }
        }
    }
}

/// Scratch directory holding one staged source file
///
/// The directory is deleted when the guard drops, on every exit path.
struct Scratch {
    dir: tempfile::TempDir,
}

impl Scratch {
    /// Stage source code under a fresh uniquely named directory
    async fn stage(code: &str, language: Language) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("execbox-").tempdir()?;
        tokio::fs::write(dir.path().join(language.source_file()), code).await?;
        Ok(Scratch { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scripted runtime standing in for the Docker daemon
    #[derive(Default)]
    struct FakeRuntime {
        /// Exit code reported by wait
        exit_code: i64,
        /// Raw log bytes
        log_bytes: Vec<u8>,
        /// Whether wait should outlast any configured timeout
        hang_on_wait: bool,
        /// Whether create should fail
        fail_create: bool,
        /// Recorded verbs in call order
        calls: Mutex<Vec<String>>,
        /// Specs passed to create
        specs: Mutex<Vec<ContainerSpec>>,
        /// Contents of the staged source file, read at create time
        staged_code: Mutex<Option<String>>,
    }

    impl FakeRuntime {
        fn exiting(code: i64, logs: &[u8]) -> Arc<Self> {
            Arc::new(FakeRuntime {
                exit_code: code,
                log_bytes: logs.to_vec(),
                ..FakeRuntime::default()
            })
        }

        fn hanging() -> Arc<Self> {
            Arc::new(FakeRuntime {
                hang_on_wait: true,
                ..FakeRuntime::default()
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(FakeRuntime {
                fail_create: true,
                ..FakeRuntime::default()
            })
        }

        fn record(&self, verb: &str) {
            self.calls.lock().unwrap().push(verb.to_string());
        }

        fn count(&self, verb: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == verb)
                .count()
        }

        fn specs(&self) -> Vec<ContainerSpec> {
            self.specs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn ping(&self) -> Result<()> {
            self.record("ping");
            Ok(())
        }

        async fn ensure_image(&self, _image: &str) -> Result<()> {
            self.record("ensure_image");
            Ok(())
        }

        async fn create(&self, spec: &ContainerSpec) -> Result<String> {
            self.record("create");
            if self.fail_create {
                return Err(Error::Runtime("Docker daemon unreachable".to_string()));
            }

            self.specs.lock().unwrap().push(spec.clone());
            if let Some(bind) = spec.binds.first() {
                if let Ok(code) = std::fs::read_to_string(bind.host.join("main.py")) {
                    *self.staged_code.lock().unwrap() = Some(code);
                }
            }
            Ok("fake-container".to_string())
        }

        async fn start(&self, _id: &str) -> Result<()> {
            self.record("start");
            Ok(())
        }

        async fn wait(&self, _id: &str) -> Result<i64> {
            self.record("wait");
            if self.hang_on_wait {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(self.exit_code)
        }

        async fn logs(&self, _id: &str) -> Result<Vec<u8>> {
            self.record("logs");
            Ok(self.log_bytes.clone())
        }

        async fn kill(&self, _id: &str) -> Result<()> {
            self.record("kill");
            Ok(())
        }

        async fn remove(&self, _id: &str) -> Result<()> {
            self.record("remove");
            Ok(())
        }
    }

    fn service(runtime: Arc<FakeRuntime>) -> ExecutionService {
        let config = ExecutorConfig {
            timeout_ms: 100,
            ..ExecutorConfig::default()
        };
        ExecutionService::new(runtime, config)
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let runtime = FakeRuntime::exiting(0, b"hello\n");
        let svc = service(runtime.clone());

        let result = svc.execute(&ExecutionRequest::new("print('hello')")).await;

        assert!(result.success);
        assert_eq!(result.output, "hello\n");
        assert_eq!(result.error, "");
        assert_eq!(runtime.count("create"), 1);
        assert_eq!(runtime.count("remove"), 1);
        assert_eq!(runtime.count("kill"), 0);
    }

    #[tokio::test]
    async fn test_source_file_staged_and_cleaned_up() {
        let runtime = FakeRuntime::exiting(0, b"");
        let svc = service(runtime.clone());

        svc.execute(&ExecutionRequest::new("x = 40 + 2")).await;

        let staged = runtime.staged_code.lock().unwrap().clone();
        assert_eq!(staged.as_deref(), Some("x = 40 + 2"));

        // the scratch directory is gone once the call returns
        let spec = &runtime.specs()[0];
        let bind = &spec.binds[0];
        assert!(bind.read_only);
        assert_eq!(bind.container, "/app/code");
        assert!(!bind.host.exists());
    }

    #[tokio::test]
    async fn test_container_spec_carries_limits() {
        let runtime = FakeRuntime::exiting(0, b"");
        let svc = service(runtime.clone());

        svc.execute(&ExecutionRequest::new("pass")).await;

        let spec = &runtime.specs()[0];
        assert_eq!(spec.cmd, vec!["python", "/app/code/main.py"]);
        assert_eq!(spec.memory_bytes, Some(512 * 1024 * 1024));
        assert_eq!(spec.cpu_period, Some(100_000));
        assert_eq!(spec.cpu_quota, Some(50_000));
        assert!(spec.network_disabled());
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_execution_failed() {
        let runtime = FakeRuntime::exiting(1, b"Traceback: boom\n");
        let svc = service(runtime.clone());

        let result = svc.execute(&ExecutionRequest::new("raise SystemExit(1)")).await;

        assert!(!result.success);
        assert_eq!(result.error, "Execution failed");
        assert_eq!(result.output, "Traceback: boom\n");
        assert_eq!(runtime.count("remove"), 1);
    }

    #[tokio::test]
    async fn test_timeout_kills_exactly_once() {
        let runtime = FakeRuntime::hanging();
        let svc = service(runtime.clone());

        let result = svc.execute(&ExecutionRequest::new("while True: pass")).await;

        assert!(!result.success);
        assert_eq!(result.error, "Execution timed out");
        assert_eq!(result.output, "");
        assert_eq!(runtime.count("kill"), 1);
        assert_eq!(runtime.count("remove"), 1);
    }

    #[tokio::test]
    async fn test_create_failure_skips_kill_and_remove() {
        let runtime = FakeRuntime::unreachable();
        let svc = service(runtime.clone());

        let result = svc.execute(&ExecutionRequest::new("print(1)")).await;

        assert!(!result.success);
        assert!(result.error.contains("Docker daemon unreachable"));
        assert_eq!(result.output, "");
        assert_eq!(runtime.count("kill"), 0);
        assert_eq!(runtime.count("remove"), 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_output_is_fatal() {
        let runtime = FakeRuntime::exiting(0, b"\xff\xfe");
        let svc = service(runtime.clone());

        let result = svc.execute(&ExecutionRequest::new("print(1)")).await;

        assert!(!result.success);
        assert!(result.error.contains("Invalid UTF-8"));
        assert_eq!(runtime.count("remove"), 1);
    }

    #[tokio::test]
    async fn test_typed_run_exposes_error_kinds() {
        let runtime = FakeRuntime::hanging();
        let svc = service(runtime);

        let err = svc
            .run(&ExecutionRequest::new("while True: pass"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout));
        assert!(err.is_execution_failure());
    }

    #[tokio::test]
    async fn test_packages_parses_manifest() {
        let manifest = br#"[{"name":"numpy","version":"1.26.0"},{"name":"pandas","version":"2.2.0"}]"#;
        let runtime = FakeRuntime::exiting(0, manifest);
        let svc = service(runtime.clone());

        let result = svc.list_packages().await;

        assert!(result.success);
        assert_eq!(result.packages.len(), 2);
        assert_eq!(result.packages[0].name, "numpy");
        assert_eq!(result.packages[0].version, "1.26.0");
        assert_eq!(result.error, "");

        // manifest queries run the package manager with no mounts
        let spec = &runtime.specs()[0];
        assert_eq!(spec.cmd, vec!["pip", "list", "--format=json"]);
        assert!(spec.binds.is_empty());
        assert_eq!(runtime.count("remove"), 1);
    }

    #[tokio::test]
    async fn test_packages_malformed_manifest() {
        let runtime = FakeRuntime::exiting(0, b"WARNING: pip had a bad day");
        let svc = service(runtime.clone());

        let result = svc.list_packages().await;

        assert!(!result.success);
        assert!(result.packages.is_empty());
        assert!(result.error.contains("Malformed package manifest"));
        assert_eq!(runtime.count("remove"), 1);
    }

    #[tokio::test]
    async fn test_packages_share_execution_timeout() {
        let runtime = FakeRuntime::hanging();
        let svc = service(runtime.clone());

        let result = svc.list_packages().await;

        assert!(!result.success);
        assert_eq!(result.error, "Execution timed out");
        assert_eq!(runtime.count("kill"), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_share_no_state() {
        let runtime = FakeRuntime::exiting(0, b"out\n");
        let svc = service(runtime.clone());
        let request = ExecutionRequest::new("print('out')");

        let first = svc.execute(&request).await;
        let second = svc.execute(&request).await;

        assert_eq!(first, second);
        assert_eq!(runtime.count("create"), 2);
        assert_eq!(runtime.count("remove"), 2);
    }
}
