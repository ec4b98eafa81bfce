//! Dedup engine: content-hash duplicate detection and hard-link creation.
//!
//! # Overview
//!
//! The dedup engine walks a directory tree, fingerprints file content in
//! two tiers (cheap 4KB partial digest, then full digest only where
//! partials collide), groups byte-identical files, and replaces every
//! non-master duplicate with a hard link to its group master.
//!
//! The engine is a lazy, pull-driven [`Iterator`]: each call to `next()`
//! performs at most one file's unit of work and yields at most one
//! [`DedupEvent`]. Stopping early (dropping the iterator) leaves the
//! tree consistent because every mutation sequence is isolated to one
//! file.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::dedup::{deduplicate, DedupOptions};
//! use std::path::Path;
//!
//! let options = DedupOptions::default().with_confirm_all(true);
//! for event in deduplicate(Path::new("/data/photos"), options) {
//!     println!("{:?} {}", event.action, event.path.display());
//! }
//! ```

pub mod engine;
pub mod groups;
pub mod linker;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::scanner::WalkerConfig;

pub use engine::DedupEngine;
pub use groups::{DuplicateGroup, GroupIdAllocator};
pub use linker::LinkError;

/// Caller-supplied confirmation policy.
///
/// Invoked once per candidate path; returning `false` skips the file
/// with no filesystem mutation. An "apply to all" behavior is the
/// callback's own memoization.
pub type ConfirmFn = Box<dyn FnMut(&Path) -> bool>;

/// Options for a dedup run.
#[derive(Default)]
pub struct DedupOptions {
    /// Allow every candidate without consulting the callback.
    pub confirm_all: bool,
    /// Leave new links writable instead of marking them read-only.
    pub do_not_mark_read_only: bool,
    /// Per-candidate confirmation policy. With `confirm_all` unset and
    /// no callback, every candidate is denied.
    pub confirm: Option<ConfirmFn>,
    /// Walker configuration for the scan phase.
    pub walker: WalkerConfig,
}

impl std::fmt::Debug for DedupOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupOptions")
            .field("confirm_all", &self.confirm_all)
            .field("do_not_mark_read_only", &self.do_not_mark_read_only)
            .field("confirm", &self.confirm.as_ref().map(|_| "<callback>"))
            .field("walker", &self.walker)
            .finish()
    }
}

impl DedupOptions {
    /// Allow every candidate without consulting the callback.
    #[must_use]
    pub fn with_confirm_all(mut self, confirm_all: bool) -> Self {
        self.confirm_all = confirm_all;
        self
    }

    /// Leave new links writable instead of marking them read-only.
    #[must_use]
    pub fn with_do_not_mark_read_only(mut self, do_not_mark: bool) -> Self {
        self.do_not_mark_read_only = do_not_mark;
        self
    }

    /// Set the confirmation callback.
    #[must_use]
    pub fn with_confirm(mut self, confirm: ConfirmFn) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Apply the confirmation gate to one candidate path.
    pub(crate) fn confirmed(&mut self, path: &Path) -> bool {
        if self.confirm_all {
            return true;
        }
        match self.confirm.as_mut() {
            Some(callback) => callback(path),
            None => {
                log::debug!(
                    "No confirmation callback configured, denying {}",
                    path.display()
                );
                false
            }
        }
    }
}

/// Per-file action reported by the dedup engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DedupAction {
    /// The file was scanned and fingerprinted.
    Scanned,
    /// The file was replaced with a hard link to its group master.
    Linked,
    /// The confirmation policy denied the file; nothing was changed.
    Skipped,
    /// A fatal or per-file error; see the event's error message.
    Error,
}

impl DedupAction {
    /// Stable lowercase name for logs and the CSV event log.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Linked => "linked",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

/// One observable result from the dedup engine.
///
/// A file emits at most one `Scanned` event during the walk phase and
/// at most one terminal event (`Linked`, `Skipped`, or `Error`) during
/// the link phase.
#[derive(Debug, Clone)]
pub struct DedupEvent {
    /// The file this event is about.
    pub path: PathBuf,
    /// What happened.
    pub action: DedupAction,
    /// Duplicate group id, for events tied to a confirmed group.
    pub group_id: Option<String>,
    /// Error message, present only for `Error` events.
    pub error: Option<String>,
}

impl DedupEvent {
    pub(crate) fn scanned(path: PathBuf) -> Self {
        Self {
            path,
            action: DedupAction::Scanned,
            group_id: None,
            error: None,
        }
    }

    pub(crate) fn linked(path: PathBuf, group_id: String) -> Self {
        Self {
            path,
            action: DedupAction::Linked,
            group_id: Some(group_id),
            error: None,
        }
    }

    pub(crate) fn skipped(path: PathBuf, group_id: String) -> Self {
        Self {
            path,
            action: DedupAction::Skipped,
            group_id: Some(group_id),
            error: None,
        }
    }

    pub(crate) fn error(path: PathBuf, group_id: Option<String>, message: String) -> Self {
        Self {
            path,
            action: DedupAction::Error,
            group_id,
            error: Some(message),
        }
    }
}

/// Start a dedup run over the tree rooted at `root`.
///
/// Preconditions (existence, enumerability, hard-link support) are
/// checked lazily on the first `next()` call; a failed check yields a
/// single fatal `Error` event and ends the stream. The returned engine
/// performs no I/O until iterated.
#[must_use]
pub fn deduplicate(root: &Path, options: DedupOptions) -> DedupEngine {
    DedupEngine::new(root, options)
}
