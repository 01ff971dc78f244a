//! Error types for vfeval-cli.

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// Input file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Bad command line argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Evaluation failed
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound(_) => ExitCode::from(3),
            Self::InvalidArgument(_) => ExitCode::from(4),
            Self::Io(_) => ExitCode::from(7),
            Self::Evaluation(_) => ExitCode::from(1),
        }
    }
}

impl From<vfeval::VfError> for CliError {
    fn from(e: vfeval::VfError) -> Self {
        Self::Evaluation(e.to_string())
    }
}
