//! Link orchestration: replacing a duplicate with a hard link.
//!
//! # Overview
//!
//! Hard-link creation refuses to overwrite an existing path, so the
//! duplicate must be deleted first. This creates a window in which the
//! path does not exist: if the link step then fails, the file is gone
//! and is not restored. That window is a documented trade-off of the
//! delete-then-link order, surfaced to callers through [`LinkError`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::set_read_only;

/// Error type for link replacement.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The duplicate could not be deleted; the file is untouched.
    #[error("failed to delete {path}: {source}")]
    Delete {
        /// The duplicate path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The hard link could not be created. The duplicate was already
    /// deleted, so the path is now missing.
    #[error("failed to link {path} to {master}: {source}")]
    Link {
        /// The duplicate path that no longer exists
        path: PathBuf,
        /// The master the link should have pointed at
        master: PathBuf,
        /// The underlying I/O error, including the OS error code
        #[source]
        source: io::Error,
    },
}

/// Replace `duplicate` with a hard link to `master`.
///
/// Steps, in order: delete the duplicate if present, create the link at
/// the freed path, and (when `mark_read_only` is set) mark the new link
/// read-only so in-place edits cannot silently reach the master and all
/// of its siblings. A failure to set the attribute is logged but does
/// not fail the replacement.
///
/// # Errors
///
/// Returns [`LinkError::Delete`] if the duplicate exists and cannot be
/// removed, or [`LinkError::Link`] if link creation fails after the
/// delete.
pub fn replace_with_link(
    master: &Path,
    duplicate: &Path,
    mark_read_only: bool,
) -> Result<(), LinkError> {
    match fs::remove_file(duplicate) {
        Ok(()) => {}
        // Already gone; the path is free for the link either way
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("Duplicate already absent: {}", duplicate.display());
        }
        Err(e) => {
            return Err(LinkError::Delete {
                path: duplicate.to_path_buf(),
                source: e,
            });
        }
    }

    fs::hard_link(master, duplicate).map_err(|e| LinkError::Link {
        path: duplicate.to_path_buf(),
        master: master.to_path_buf(),
        source: e,
    })?;

    if mark_read_only {
        if let Err(e) = set_read_only(duplicate, true) {
            log::warn!(
                "Linked {} but failed to mark it read-only: {}",
                duplicate.display(),
                e
            );
        }
    }

    log::debug!(
        "Linked {} -> {}",
        duplicate.display(),
        master.display()
    );
    Ok(())
}
