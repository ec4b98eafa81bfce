//! Platform file identity and hard-link capability.
//!
//! # Overview
//!
//! A hard-link group is a set of directory entries sharing one on-disk
//! allocation. Detecting such a group has nothing to do with content:
//! two entries are siblings exactly when they share a volume-scoped
//! *file identity*. This module resolves that identity and probes
//! whether the target volume supports hard links at all.
//!
//! # Platform Support
//!
//! - **Unix**: `(device, inode)` pair from file metadata
//! - **Windows**: `(volume serial, file index high/low)` via
//!   `GetFileInformationByHandle`
//! - **Other**: identity resolution reports `None` for every path
//!
//! Resolution failures are never fatal; a file without an identity is
//! simply excluded from identity grouping.

use std::fs;
use std::io;
use std::path::Path;

/// Volume-scoped identity of one on-disk allocation.
///
/// Multiple paths sharing a `FileIdentity` are hard-link siblings. The
/// identity survives renames and does not change when content changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(windows)]
    volume_serial: u32,
    #[cfg(windows)]
    file_index_high: u32,
    #[cfg(windows)]
    file_index_low: u32,
    #[cfg(not(any(unix, windows)))]
    _unsupported: (),
}

/// Resolve the file identity of a path.
///
/// Opens the file for read with sharing permitted, queries platform
/// metadata, and closes the handle on every exit path. Returns `None`
/// on any failure (missing file, access denied, non-supporting
/// filesystem); callers treat that as "exclude from identity grouping",
/// not as an error.
#[must_use]
pub fn resolve_identity(path: &Path) -> Option<FileIdentity> {
    match resolve_identity_impl(path) {
        Some(identity) => Some(identity),
        None => {
            log::debug!("No file identity for {}", path.display());
            None
        }
    }
}

#[cfg(unix)]
fn resolve_identity_impl(path: &Path) -> Option<FileIdentity> {
    use std::os::unix::fs::MetadataExt;

    // The handle is dropped (closed) when `file` leaves scope,
    // including on the error paths below.
    let file = fs::File::open(path).ok()?;
    let metadata = file.metadata().ok()?;
    Some(FileIdentity {
        dev: metadata.dev(),
        ino: metadata.ino(),
    })
}

#[cfg(windows)]
fn resolve_identity_impl(path: &Path) -> Option<FileIdentity> {
    use std::os::windows::ffi::OsStrExt;
    use std::ptr;
    use winapi::um::fileapi::{
        CreateFileW, GetFileInformationByHandle, BY_HANDLE_FILE_INFORMATION, OPEN_EXISTING,
    };
    use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
    use winapi::um::winnt::{
        FILE_ATTRIBUTE_NORMAL, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    };

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    // Desired access 0: we only need metadata, and full sharing keeps
    // other readers, writers, and deleters unblocked.
    unsafe {
        let handle = CreateFileW(
            wide.as_ptr(),
            0,
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
            ptr::null_mut(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            ptr::null_mut(),
        );
        if handle == INVALID_HANDLE_VALUE {
            return None;
        }

        let mut info: BY_HANDLE_FILE_INFORMATION = std::mem::zeroed();
        let ok = GetFileInformationByHandle(handle, &mut info);
        CloseHandle(handle);
        if ok == 0 {
            return None;
        }

        Some(FileIdentity {
            volume_serial: info.dwVolumeSerialNumber,
            file_index_high: info.nFileIndexHigh,
            file_index_low: info.nFileIndexLow,
        })
    }
}

#[cfg(not(any(unix, windows)))]
fn resolve_identity_impl(_path: &Path) -> Option<FileIdentity> {
    None
}

/// Probe whether the volume containing `dir` supports hard links.
///
/// Creates a probe file inside `dir`, attempts a real hard link to it,
/// and removes both. This is a capability check, not a guess from
/// filesystem names: network mounts and FAT variants fail here even
/// though their reported type strings vary.
///
/// # Errors
///
/// Returns the underlying I/O error if the probe file cannot be
/// created or the link attempt fails.
pub fn probe_hard_link_support(dir: &Path) -> io::Result<()> {
    let probe = dir.join(format!(".dupelink-probe-{}", std::process::id()));
    let link = dir.join(format!(".dupelink-probe-{}-link", std::process::id()));

    fs::File::create(&probe)?;
    let result = fs::hard_link(&probe, &link);

    let _ = fs::remove_file(&link);
    let _ = fs::remove_file(&probe);

    result
}

/// Set or clear the read-only attribute of a file.
///
/// # Errors
///
/// Returns the underlying I/O error if the metadata cannot be read or
/// the permissions cannot be updated.
pub fn set_read_only(path: &Path, read_only: bool) -> io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(read_only);
    fs::set_permissions(path, perms)
}
