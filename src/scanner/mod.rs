//! Scanner module for directory traversal, content fingerprinting, and
//! file identity resolution.
//!
//! This module provides functionality for:
//! - Deterministic single-threaded directory walking
//! - SHA-256 content fingerprints (partial and full)
//! - Volume-scoped file identity (hard-link sibling detection)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: SHA-256 fingerprinting (streaming)
//! - [`identity`]: Platform file identity and hard-link capability
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for file in walker {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod hasher;
pub mod identity;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{fingerprint_to_hex, Fingerprint, Hasher, PARTIAL_FINGERPRINT_LEN};
pub use identity::{probe_hard_link_support, resolve_identity, set_read_only, FileIdentity};
pub use walker::Walker;

/// Metadata for a discovered file.
///
/// Contains everything the engines need before touching file content:
/// path, size, and the attribute bits that gate processing.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Whether the read-only attribute is set
    pub read_only: bool,
    /// Whether this entry is a symbolic link
    pub is_symlink: bool,
}

impl FileEntry {
    /// Create a new entry with no attribute bits set.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            read_only: false,
            is_symlink: false,
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Glob patterns to ignore (gitignore-style).
    /// These are applied in addition to any .gitignore files.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    /// Create a configuration with the given ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(ignore_patterns: Vec<String>) -> Self {
        Self { ignore_patterns }
    }
}

/// Errors that can occur during fingerprinting.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error against the path it occurred on.
    pub(crate) fn from_io(path: &std::path::Path, source: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match source.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_new() {
        let entry = FileEntry::new(PathBuf::from("/test/file.txt"), 1024);

        assert_eq!(entry.path, PathBuf::from("/test/file.txt"));
        assert_eq!(entry.size, 1024);
        assert!(!entry.read_only);
        assert!(!entry.is_symlink);
    }

    #[test]
    fn test_walker_config_default() {
        let config = WalkerConfig::default();
        assert!(config.ignore_patterns.is_empty());
    }

    #[test]
    fn test_hash_error_display() {
        let err = HashError::NotFound(PathBuf::from("/test"));
        assert_eq!(err.to_string(), "file not found: /test");

        let err = HashError::PermissionDenied(PathBuf::from("/secret"));
        assert_eq!(err.to_string(), "permission denied: /secret");
    }

    #[test]
    fn test_hash_error_from_io() {
        let err = HashError::from_io(
            std::path::Path::new("/missing"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, HashError::NotFound(_)));

        let err = HashError::from_io(
            std::path::Path::new("/dev/full"),
            std::io::Error::other("boom"),
        );
        assert!(matches!(err, HashError::Io { .. }));
    }
}
