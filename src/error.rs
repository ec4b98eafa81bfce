//! Structured error handling and exit codes.

use std::io;
use std::path::PathBuf;

use serde::Serialize;

/// Exit codes for the DupeLink application.
///
/// - 0: Success (completed normally, work was done)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to do (completed normally, no duplicates or link groups)
/// - 3: Partial success (completed with some non-fatal per-file errors)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed and performed (or reported) work.
    Success = 0,
    /// General error: an unexpected or fatal error occurred.
    GeneralError = 1,
    /// Nothing to do: the run completed but found nothing to process.
    NothingToDo = 2,
    /// Partial success: completed but some files failed.
    PartialSuccess = 3,
    /// Interrupted: the run was interrupted by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DL000",
            Self::GeneralError => "DL001",
            Self::NothingToDo => "DL002",
            Self::PartialSuccess => "DL003",
            Self::Interrupted => "DL130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DL001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Fatal engine errors detected before any mutation.
///
/// Each of these terminates an engine's event stream after exactly one
/// terminal error event. Per-file failures are not represented here;
/// they are carried inside ordinary events and never stop a run.
#[derive(thiserror::Error, Debug)]
pub enum FatalError {
    /// The target path does not exist.
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    /// The target path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The target directory cannot be enumerated.
    #[error("permission denied enumerating {path}: {source}")]
    PermissionDenied {
        /// The root that could not be enumerated
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The containing volume does not support hard links.
    #[error("volume does not support hard links at {path}: {source}")]
    UnsupportedFilesystem {
        /// The probed directory
        path: PathBuf,
        /// The underlying I/O error from the probe
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NothingToDo.as_i32(), 2);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "DL000");
        assert_eq!(ExitCode::Interrupted.code_prefix(), "DL130");
    }

    #[test]
    fn test_structured_error() {
        let err = anyhow::anyhow!("something broke");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.code, "DL001");
        assert_eq!(structured.exit_code, 1);
        assert_eq!(structured.message, "something broke");
        assert!(!structured.interrupted);
    }

    #[test]
    fn test_fatal_error_display() {
        let err = FatalError::DirectoryNotFound(PathBuf::from("/missing"));
        assert_eq!(err.to_string(), "directory not found: /missing");

        let err = FatalError::NotADirectory(PathBuf::from("/a/file.txt"));
        assert_eq!(err.to_string(), "not a directory: /a/file.txt");
    }
}
