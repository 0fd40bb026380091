//! Error types for execbox

use thiserror::Error;

/// Result type alias using execbox's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for execbox
///
/// The set of kinds is closed on purpose: callers of the typed API
/// ([`crate::sandbox::ExecutionService::run`] and friends) branch on the
/// variant instead of string-matching messages. The boundary API converts
/// every variant into a result shape, so these never cross the wire as
/// faults.
#[derive(Error, Debug)]
pub enum Error {
    /// The container did not finish within the configured wall-clock limit
    #[error("Execution timed out")]
    Timeout,

    /// The code ran to completion but exited non-zero
    ///
    /// Carries the exit code and whatever output the run produced; the
    /// display string stays the stable `"Execution failed"` message.
    #[error("Execution failed")]
    NonZeroExit {
        /// Process exit status code
        code: i64,
        /// Combined output captured before the failure
        output: String,
    },

    /// Container runtime failure (daemon unreachable, image missing,
    /// create/start/wait/logs/remove errors)
    #[error("Container runtime error: {0}")]
    Runtime(String),

    /// Container output was not valid UTF-8
    #[error("Invalid UTF-8 in output: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Package manifest could not be parsed
    #[error("Malformed package manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Check if the failure was produced by the submitted code itself
    /// rather than by the shim or the runtime
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Error::Timeout | Error::NonZeroExit { .. })
    }

    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(err: bollard::errors::Error) -> Self {
        Error::Runtime(err.to_string())
    }
}
