//! # Execbox
//!
//! Ephemeral container-based code execution with resource and time limits.
//!
//! ## Features
//!
//! - **Single-use containers:** Every call provisions a fresh container and
//!   destroys it before returning
//! - **Fixed resource caps:** Memory ceiling, CPU period/quota, and no
//!   network access
//! - **Time-bounded:** A configurable wall-clock limit applies to every
//!   container the service launches
//! - **Never throws at the boundary:** Callers always receive a structured
//!   result; typed errors stay available for library use
//! - **Runtime-agnostic core:** The shim talks to a [`runtime::ContainerRuntime`]
//!   trait; Docker via bollard is the shipped implementation

pub mod api;
pub mod config;
pub mod error;
pub mod runtime;
pub mod sandbox;

pub use config::Config;
pub use error::{Error, Result};
pub use runtime::{ContainerRuntime, DockerRuntime};
pub use sandbox::{
    ExecutionRequest, ExecutionResult, ExecutionService, Language, PackageInfo, PackageListResult,
};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
