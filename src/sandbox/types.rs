//! Request and result shapes for the execution boundary

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Languages the execution image can run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Python 3, the interpreter baked into the default image
    #[default]
    Python,
}

impl Language {
    /// Name of the staged source file for this language
    pub fn source_file(&self) -> &'static str {
        match self {
            Language::Python => "main.py",
        }
    }

    /// Interpreter binary inside the execution image
    pub fn interpreter(&self) -> &'static str {
        match self {
            Language::Python => "python",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "python" | "py" | "python3" => Ok(Language::Python),
            _ => Err(Error::InvalidInput(format!("Unsupported language: {}", s))),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Python => write!(f, "python"),
        }
    }
}

/// Request to execute a snippet of code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// The code to execute
    pub code: String,
    /// Programming language
    #[serde(default)]
    pub language: Language,
}

impl ExecutionRequest {
    /// Create a new execution request with the default language
    pub fn new(code: impl Into<String>) -> Self {
        ExecutionRequest {
            code: code.into(),
            language: Language::default(),
        }
    }

    /// Set the language
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// Outcome of one execution call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the code ran to completion with exit status zero
    pub success: bool,
    /// Combined stdout and stderr text
    pub output: String,
    /// Failure message, empty on success
    #[serde(default)]
    pub error: String,
}

impl ExecutionResult {
    /// Result for a run that exited zero
    pub fn success(output: String) -> Self {
        ExecutionResult {
            success: true,
            output,
            error: String::new(),
        }
    }

    /// Result for a failed run
    pub fn failure(error: impl Into<String>, output: String) -> Self {
        ExecutionResult {
            success: false,
            output,
            error: error.into(),
        }
    }
}

impl From<Error> for ExecutionResult {
    fn from(err: Error) -> Self {
        let error = err.to_string();
        // a non-zero exit keeps whatever the program printed before failing
        let output = match err {
            Error::NonZeroExit { output, .. } => output,
            _ => String::new(),
        };
        ExecutionResult {
            success: false,
            output,
            error,
        }
    }
}

/// One installed package from the image manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
}

/// Outcome of a package manifest query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageListResult {
    /// Whether the manifest was retrieved and parsed
    pub success: bool,
    /// Installed packages, empty on failure
    #[serde(default)]
    pub packages: Vec<PackageInfo>,
    /// Failure message, omitted on success
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl PackageListResult {
    /// Result for a parsed manifest
    pub fn success(packages: Vec<PackageInfo>) -> Self {
        PackageListResult {
            success: true,
            packages,
            error: String::new(),
        }
    }

    /// Result for a failed query
    pub fn failure(error: impl Into<String>) -> Self {
        PackageListResult {
            success: false,
            packages: Vec::new(),
            error: error.into(),
        }
    }
}

impl From<Error> for PackageListResult {
    fn from(err: Error) -> Self {
        PackageListResult::failure(err.to_string())
    }
}
