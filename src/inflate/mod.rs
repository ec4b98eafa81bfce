//! Inflate engine: hard-link-group detection and link breaking.
//!
//! # Overview
//!
//! The inflate engine walks a directory tree, resolves the file
//! identity of every regular file, groups the paths that share one
//! on-disk allocation (an existing hard-link set), and restores every
//! non-master member to an independent copy of the master's bytes.
//!
//! Identity resolution is orthogonal to content hashing: two distinct
//! allocations with identical bytes are *not* an identity group, and
//! an identity group needs no fingerprinting to be recognized.
//!
//! Like the dedup engine, this is a lazy, pull-driven [`Iterator`] of
//! [`InflateEvent`]s; stopping early leaves the tree consistent.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::inflate::{inflate, InflateOptions};
//! use std::path::Path;
//!
//! let options = InflateOptions::default().with_confirm_all(true);
//! for event in inflate(Path::new("/data/photos"), options) {
//!     println!("{:?} {}", event.action, event.path.display());
//! }
//! ```

pub mod engine;
pub mod unlinker;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::dedup::groups::sort_paths;
use crate::dedup::ConfirmFn;
use crate::scanner::WalkerConfig;

pub use engine::InflateEngine;
pub use unlinker::UnlinkError;

/// Options for an inflate run.
#[derive(Default)]
pub struct InflateOptions {
    /// Allow every candidate without consulting the callback.
    pub confirm_all: bool,
    /// Per-candidate confirmation policy. With `confirm_all` unset and
    /// no callback, every candidate is denied.
    pub confirm: Option<ConfirmFn>,
    /// Walker configuration for the scan phase.
    pub walker: WalkerConfig,
}

impl std::fmt::Debug for InflateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InflateOptions")
            .field("confirm_all", &self.confirm_all)
            .field("confirm", &self.confirm.as_ref().map(|_| "<callback>"))
            .field("walker", &self.walker)
            .finish()
    }
}

impl InflateOptions {
    /// Allow every candidate without consulting the callback.
    #[must_use]
    pub fn with_confirm_all(mut self, confirm_all: bool) -> Self {
        self.confirm_all = confirm_all;
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

/// Per-file action reported by the inflate engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InflateAction {
    /// The file was scanned and its identity resolved (or attempted).
    Scanned,
    /// The link was broken and an independent copy restored.
    Inflated,
    /// The confirmation policy denied the file; nothing was changed.
    Skipped,
    /// A fatal or per-file error; see the event's error message.
    Error,
}

impl InflateAction {
    /// Stable lowercase name for logs and the CSV event log.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scanned => "scanned",
            Self::Inflated => "inflated",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

/// One observable result from the inflate engine.
#[derive(Debug, Clone)]
pub struct InflateEvent {
    /// The file this event is about.
    pub path: PathBuf,
    /// What happened.
    pub action: InflateAction,
    /// Identity group id, for events tied to a link group.
    pub group_id: Option<String>,
    /// Error message, present only for `Error` events.
    pub error: Option<String>,
}

impl InflateEvent {
    pub(crate) fn scanned(path: PathBuf) -> Self {
        Self {
            path,
            action: InflateAction::Scanned,
            group_id: None,
            error: None,
        }
    }

    pub(crate) fn inflated(path: PathBuf, group_id: String) -> Self {
        Self {
            path,
            action: InflateAction::Inflated,
            group_id: Some(group_id),
            error: None,
        }
    }

    pub(crate) fn skipped(path: PathBuf, group_id: String) -> Self {
        Self {
            path,
            action: InflateAction::Skipped,
            group_id: Some(group_id),
            error: None,
        }
    }

    pub(crate) fn error(path: PathBuf, group_id: Option<String>, message: String) -> Self {
        Self {
            path,
            action: InflateAction::Error,
            group_id,
            error: Some(message),
        }
    }
}

/// A set of paths sharing one on-disk allocation.
///
/// Same shape and invariants as a duplicate group, but keyed by file
/// identity rather than content: these paths are *already* hard-linked.
#[derive(Debug, Clone)]
pub struct IdentityGroup {
    /// Opaque per-run group id.
    pub id: String,
    /// The canonical surviving entry.
    pub master: PathBuf,
    /// Non-master siblings, in case-insensitive sorted order.
    pub members: Vec<PathBuf>,
}

impl IdentityGroup {
    /// Build a group from the paths of one identity bucket.
    ///
    /// Returns `None` unless the bucket has at least two paths.
    #[must_use]
    pub fn from_paths(id: String, mut paths: Vec<PathBuf>) -> Option<Self> {
        if paths.len() < 2 {
            return None;
        }
        sort_paths(&mut paths);
        let mut members = paths.into_iter();
        let master = members.next().expect("bucket has at least two paths");
        Some(Self {
            id,
            master,
            members: members.collect(),
        })
    }

    /// Number of non-master siblings.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Start an inflate run over the tree rooted at `root`.
///
/// Existence and enumerability of the root are checked lazily on the
/// first `next()` call; a failure yields a single fatal `Error` event
/// and ends the stream. The returned engine performs no I/O until
/// iterated.
#[must_use]
pub fn inflate(root: &Path, options: InflateOptions) -> InflateEngine {
    InflateEngine::new(root, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(InflateAction::Scanned.as_str(), "scanned");
        assert_eq!(InflateAction::Inflated.as_str(), "inflated");
        assert_eq!(InflateAction::Skipped.as_str(), "skipped");
        assert_eq!(InflateAction::Error.as_str(), "error");
    }

    #[test]
    fn test_identity_group_master_selection() {
        let group = IdentityGroup::from_paths(
            "1".to_string(),
            vec![PathBuf::from("/d/B.txt"), PathBuf::from("/d/a.txt")],
        )
        .unwrap();
        assert_eq!(group.master, PathBuf::from("/d/a.txt"));
        assert_eq!(group.members, vec![PathBuf::from("/d/B.txt")]);
        assert_eq!(group.member_count(), 1);
    }

    #[test]
    fn test_identity_group_requires_two_paths() {
        assert!(IdentityGroup::from_paths("1".into(), vec![PathBuf::from("/x")]).is_none());
    }

    #[test]
    fn test_no_callback_denies() {
        let mut options = InflateOptions::default();
        assert!(!options.confirmed(Path::new("/a")));
    }
}
