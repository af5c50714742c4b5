//! Custom error types for workloop.
//!
//! This module provides structured error types that enable better
//! error handling, reporting, and recovery throughout the application.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::ValidationIssue;

/// Main error type for workloop operations
#[derive(Error, Debug)]
pub enum WorkloopError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Failed to load configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    /// Missing required file
    #[error("Missing required file: {path}")]
    MissingFile { path: PathBuf },

    /// Missing required tool
    #[error("Missing required tool: {tool}")]
    MissingTool { tool: String },

    // =========================================================================
    // Document Errors
    // =========================================================================
    /// Work-item document could not be read or parsed
    #[error("Document error: {message}")]
    Document { message: String },

    /// Document failed structural validation
    #[error("Document validation failed with {} issue(s)", .issues.len())]
    Validation { issues: Vec<ValidationIssue> },

    // =========================================================================
    // Loop Execution Errors
    // =========================================================================
    /// Loop execution failed
    #[error("Loop execution error: {message}")]
    Loop { message: String },

    /// Worker process failed to spawn or crashed
    #[error("Worker process failed: {message}")]
    Worker { message: String },

    // =========================================================================
    // Archive Errors
    // =========================================================================
    /// Archive operation failed
    #[error("Archive error: {message}")]
    Archive { message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// IO error wrapper
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WorkloopError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error with path
    pub fn config_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path),
        }
    }

    /// Create a document error
    pub fn document(message: impl Into<String>) -> Self {
        Self::Document {
            message: message.into(),
        }
    }

    /// Create a loop error
    pub fn loop_error(message: impl Into<String>) -> Self {
        Self::Loop {
            message: message.into(),
        }
    }

    /// Create a worker error
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Create an archive error
    pub fn archive(message: impl Into<String>) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if this error is fatal (should abort before any iteration runs)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::InvalidConfig { .. }
                | Self::MissingFile { .. }
                | Self::MissingTool { .. }
                | Self::Validation { .. }
        )
    }

    /// Check if this error allows the loop to keep making forward progress
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Archive { .. } | Self::Worker { .. })
    }

    /// Get error code for exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } | Self::InvalidConfig { .. } => 7,
            Self::MissingFile { .. } | Self::MissingTool { .. } => 6,
            Self::Validation { .. } => 3,
            Self::Document { .. } => 2,
            _ => 1,
        }
    }
}

/// Type alias for workloop results
pub type Result<T> = std::result::Result<T, WorkloopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorkloopError::MissingTool {
            tool: "claude".to_string(),
        };
        assert!(err.to_string().contains("claude"));
    }

    #[test]
    fn test_is_fatal() {
        assert!(WorkloopError::config("bad").is_fatal());
        assert!(WorkloopError::MissingTool {
            tool: "claude".into()
        }
        .is_fatal());
        assert!(!WorkloopError::archive("unreadable").is_fatal());
        assert!(!WorkloopError::worker("crashed").is_fatal());
    }

    #[test]
    fn test_is_recoverable() {
        assert!(WorkloopError::archive("skip").is_recoverable());
        assert!(WorkloopError::worker("timeout").is_recoverable());
        assert!(!WorkloopError::config("bad").is_recoverable());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(WorkloopError::config("test").exit_code(), 7);
        assert_eq!(
            WorkloopError::MissingFile {
                path: PathBuf::from("workplan.json")
            }
            .exit_code(),
            6
        );
        assert_eq!(
            WorkloopError::Validation { issues: vec![] }.exit_code(),
            3
        );
        assert_eq!(WorkloopError::loop_error("test").exit_code(), 1);
    }

    #[test]
    fn test_config_with_path() {
        let path = PathBuf::from("/test/workplan.json");
        let err = WorkloopError::config_with_path("failed to parse", path.clone());
        if let WorkloopError::Config {
            message,
            path: opt_path,
        } = err
        {
            assert_eq!(message, "failed to parse");
            assert_eq!(opt_path, Some(path));
        } else {
            panic!("Wrong error variant");
        }
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: WorkloopError = io_err.into();
        assert!(matches!(err, WorkloopError::Io(_)));
        assert!(err.to_string().contains("access denied"));
    }
}
