//! Configuration validation
//!
//! Validates configuration and reports issues.

use super::types::Config;
use crate::runtime::parse_memory_limit;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Validate the configuration
pub fn validate_config(config: &Config) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_executor_config(config, result);
    result = validate_server_config(config, result);

    result
}

fn validate_executor_config(
    config: &Config,
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    let executor = &config.executor;

    if executor.image.is_empty() {
        result = result.with_error(
            ValidationIssue::new("executor.image", "No execution image specified")
                .with_suggestion("Set executor.image to a pre-built runner image tag"),
        );
    }

    if parse_memory_limit(&executor.memory_limit).is_none() {
        result = result.with_error(
            ValidationIssue::new(
                "executor.memory_limit",
                format!("Unparseable memory limit: {:?}", executor.memory_limit),
            )
            .with_suggestion("Use a size like \"512m\" or \"1g\""),
        );
    }

    if executor.timeout_ms == 0 {
        result = result.with_error(
            ValidationIssue::new("executor.timeout_ms", "Execution timeout is zero")
                .with_suggestion("Set a positive limit in milliseconds (default 30000)"),
        );
    } else if executor.timeout_ms > 600_000 {
        result = result.with_warning(ValidationIssue::new(
            "executor.timeout_ms",
            format!(
                "Execution timeout is over ten minutes ({} ms)",
                executor.timeout_ms
            ),
        ));
    }

    if executor.cpu_period <= 0 || executor.cpu_quota <= 0 {
        result = result.with_error(
            ValidationIssue::new(
                "executor.cpu_period",
                "CPU period and quota must be positive",
            )
            .with_suggestion("Defaults are period 100000, quota 50000 (half a core)"),
        );
    } else if executor.cpu_quota > executor.cpu_period {
        result = result.with_warning(ValidationIssue::new(
            "executor.cpu_quota",
            "CPU quota exceeds the period; containers may use more than one core",
        ));
    }

    if !executor.mount_point.starts_with('/') {
        result = result.with_error(
            ValidationIssue::new(
                "executor.mount_point",
                format!("Mount point is not absolute: {:?}", executor.mount_point),
            )
            .with_suggestion("Use an absolute container path such as /app/code"),
        );
    }

    if !executor.network_disabled() {
        result = result.with_warning(
            ValidationIssue::new(
                "executor.network",
                format!(
                    "Execution containers will have network access ({:?})",
                    executor.network
                ),
            )
            .with_suggestion("Set executor.network to \"none\" to isolate containers"),
        );
    }

    result
}

fn validate_server_config(
    config: &Config,
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    if config.server.bind.is_empty() {
        result = result.with_error(
            ValidationIssue::new("server.bind", "Empty bind address")
                .with_suggestion("Use 127.0.0.1 for local-only access"),
        );
    }

    result
}
