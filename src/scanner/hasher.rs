//! SHA-256 content fingerprinting with streaming support.
//!
//! # Overview
//!
//! This module provides the [`Hasher`] struct for computing the two
//! fingerprints used by duplicate detection:
//!
//! - **Partial fingerprint**: digest of at most the first 4096 bytes.
//!   Files whose leading bytes differ cannot be identical, so this acts
//!   as a cheap pre-filter before any full read.
//! - **Full fingerprint**: digest over the entire byte stream, computed
//!   only when two or more files share a partial fingerprint.
//!
//! Both use the same algorithm so equal partial digests are directly
//! comparable. Failures are per-file and never abort a scan; the caller
//! turns them into error events and moves on.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::HashError;

/// Number of leading bytes covered by the partial fingerprint.
pub const PARTIAL_FINGERPRINT_LEN: usize = 4096;

/// Buffer size for streaming the full fingerprint.
const STREAM_BUF_LEN: usize = 64 * 1024;

/// A SHA-256 digest value.
pub type Fingerprint = [u8; 32];

/// Convert a fingerprint to a lowercase hexadecimal string.
#[must_use]
pub fn fingerprint_to_hex(fingerprint: &Fingerprint) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(64);
    for byte in fingerprint {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

/// SHA-256 file fingerprint engine.
///
/// Stateless; one instance can fingerprint any number of files.
#[derive(Debug, Default)]
pub struct Hasher;

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compute the partial fingerprint of a file.
    ///
    /// Reads at most the first [`PARTIAL_FINGERPRINT_LEN`] bytes (fewer
    /// if the file is shorter) and digests exactly the bytes read.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn partial(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let mut buf = [0u8; PARTIAL_FINGERPRINT_LEN];
        let mut filled = 0;
        // Loop until the buffer is full or the file ends; a single read
        // may legally return fewer bytes than requested.
        while filled < buf.len() {
            match file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }

        let mut hasher = Sha256::new();
        hasher.update(&buf[..filled]);
        Ok(hasher.finalize().into())
    }

    /// Compute the full fingerprint of a file by streaming its content.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read
    /// fails mid-stream (permission change, deletion race).
    pub fn full(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; STREAM_BUF_LEN];
        loop {
            match file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => hasher.update(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(HashError::from_io(path, e)),
            }
        }

        Ok(hasher.finalize().into())
    }
}
