//! Error types for Grover
//!
//! Tool lifecycle, configuration and download failures. Assembly metadata
//! failures live next to the reader in `metadata::MetadataError`.

use std::path::PathBuf;
use thiserror::Error;

/// All error types that can occur while managing external tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Filesystem operation failed
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP or local fetch of a tool source failed
    #[error("Download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// Downloaded content does not match the published digest
    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    /// The installed or extracted tree does not contain the tool executable
    #[error("Executable {exe} not found under {}", .dir.display())]
    ExecutableNotFound { exe: String, dir: PathBuf },

    /// An installer subprocess failed
    #[error("Installing {tool} failed: {reason}")]
    InstallFailed { tool: String, reason: String },

    /// The solver a dependent tool should link to is not installed
    #[error("Cannot link {tool}: solver {solver} is not installed at {}", .path.display())]
    SolverMissing {
        tool: String,
        solver: String,
        path: PathBuf,
    },

    /// Tool settings could not be bound
    #[error("Invalid tool settings: {0}")]
    InvalidSettings(String),

    /// The user interrupted the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ToolError {
    /// Wraps an I/O error with a description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ToolError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_context() {
        let err = ToolError::io(
            "Creating /tools/z3",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "Creating /tools/z3: denied");
    }

    #[test]
    fn test_executable_not_found_error() {
        let err = ToolError::ExecutableNotFound {
            exe: "z3".to_string(),
            dir: PathBuf::from("/tmp/stage"),
        };
        assert_eq!(err.to_string(), "Executable z3 not found under /tmp/stage");
    }

    #[test]
    fn test_checksum_mismatch_error() {
        let err = ToolError::ChecksumMismatch {
            url: "https://example/z3.zip".to_string(),
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Checksum mismatch for https://example/z3.zip: expected aa, got bb"
        );
    }
}
