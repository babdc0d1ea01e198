//! Error handling module for jarvis-setup
//!
//! Provides centralized error handling with proper error types using thiserror.
//! Planner and report errors live next to their modules and convert into
//! `SetupError` at the binary boundary.

use crate::logic::planner::PlanError;
use crate::report::ReportTransitionError;
use thiserror::Error;

/// Main error type for jarvis-setup
#[derive(Error, Debug)]
pub enum SetupError {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unusable prerequisite (interpreter absent or too old)
    #[error("Missing prerequisite: {0}")]
    Prerequisite(#[from] PlanError),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Virtual environment could not be created
    #[error("Virtual environment error: {0}")]
    Venv(String),

    /// Interactive prompt failed or was aborted
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Report state machine transition errors
    #[error("Report transition error: {0}")]
    Report(#[from] ReportTransitionError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for jarvis-setup operations
pub type Result<T> = std::result::Result<T, SetupError>;

impl SetupError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a virtual environment error
    pub fn venv(msg: impl Into<String>) -> Self {
        Self::Venv(msg.into())
    }

    /// Create a prompt error
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::Prompt(msg.into())
    }

    /// Process exit code for this error.
    ///
    /// Every fatal error maps to 1; declined continuation is not an error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PythonVersion;

    #[test]
    fn test_error_display() {
        let err = SetupError::config("venv_dir must not be empty");
        assert_eq!(err.to_string(), "Configuration error: venv_dir must not be empty");

        let err = SetupError::venv("python -m venv exited with code 1");
        assert_eq!(
            err.to_string(),
            "Virtual environment error: python -m venv exited with code 1"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SetupError = io_err.into();
        assert!(matches!(err, SetupError::Io(_)));
    }

    #[test]
    fn test_plan_error_conversion() {
        let err: SetupError = PlanError::InvalidVersion {
            found: PythonVersion::new(3, 7, 5),
        }
        .into();
        assert!(matches!(err, SetupError::Prerequisite(_)));
        assert!(err.to_string().contains("3.7.5"));
        assert_eq!(err.exit_code(), 1);
    }
}
