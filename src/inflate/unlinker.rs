//! Unlink orchestration: restoring an independent copy from a master.
//!
//! # Overview
//!
//! Breaking a hard link is a three-step sequence against one member
//! path: clear the read-only attribute if set (Windows refuses to
//! delete read-only entries), delete the link, then copy the master's
//! current bytes to a new file at the freed path. The copy uses
//! no-overwrite semantics so a concurrent writer re-creating the path
//! surfaces as an error instead of being clobbered. The master itself
//! is never touched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scanner::set_read_only;

/// Error type for link breaking.
///
/// Each variant identifies the step that failed; the member is left in
/// the state that step found it in (the sequence stops immediately).
#[derive(Debug, Error)]
pub enum UnlinkError {
    /// The read-only attribute could not be queried or cleared.
    #[error("failed to clear read-only attribute on {path}: {source}")]
    ClearAttribute {
        /// The member path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The link could not be deleted.
    #[error("failed to delete link {path}: {source}")]
    Delete {
        /// The member path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The independent copy could not be written. The link was already
    /// deleted, so the path is missing until the caller intervenes.
    #[error("failed to copy {master} to {path}: {source}")]
    Copy {
        /// The member path that should have received the copy
        path: PathBuf,
        /// The master whose bytes were being copied
        master: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Break the link at `member` and restore an independent copy of
/// `master`'s current bytes at the same path.
///
/// # Errors
///
/// Returns the [`UnlinkError`] variant for whichever step failed;
/// later steps are not attempted.
pub fn restore_copy(master: &Path, member: &Path) -> Result<(), UnlinkError> {
    let metadata = fs::metadata(member).map_err(|e| UnlinkError::ClearAttribute {
        path: member.to_path_buf(),
        source: e,
    })?;
    if metadata.permissions().readonly() {
        set_read_only(member, false).map_err(|e| UnlinkError::ClearAttribute {
            path: member.to_path_buf(),
            source: e,
        })?;
    }

    fs::remove_file(member).map_err(|e| UnlinkError::Delete {
        path: member.to_path_buf(),
        source: e,
    })?;

    copy_no_overwrite(master, member).map_err(|e| UnlinkError::Copy {
        path: member.to_path_buf(),
        master: master.to_path_buf(),
        source: e,
    })?;

    log::debug!(
        "Inflated {} from {}",
        member.display(),
        master.display()
    );
    Ok(())
}

/// Copy `from` to `to`, failing if `to` already exists.
fn copy_no_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    let mut reader = fs::File::open(from)?;
    let mut writer = fs::OpenOptions::new().write(true).create_new(true).open(to)?;
    io::copy(&mut reader, &mut writer)?;
    Ok(())
}
