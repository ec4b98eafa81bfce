//! Duplicate group construction and master selection.
//!
//! # Overview
//!
//! A duplicate set exists only when two or more files share a full
//! content fingerprint. The master is the case-insensitively smallest
//! path in the set; every other member is processed, in that same
//! sorted order, as a duplicate. Group ids are opaque strings from a
//! per-run monotonically increasing counter and carry no meaning
//! beyond uniqueness within one run.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Ordering key for case-insensitive path comparison.
///
/// Paths are NFC-normalized before case folding so decomposed (macOS
/// NFD) spellings sort identically to their composed forms.
#[must_use]
pub fn path_sort_key(path: &Path) -> String {
    path.to_string_lossy().nfc().collect::<String>().to_lowercase()
}

/// Sort paths case-insensitively, ties broken by the raw path.
///
/// The tie-break keeps the order total even for paths differing only
/// in case, so group processing order never depends on map iteration
/// order.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| path_sort_key(a).cmp(&path_sort_key(b)).then_with(|| a.cmp(b)));
}

/// Allocator for opaque, per-run unique group ids.
#[derive(Debug, Default)]
pub struct GroupIdAllocator {
    issued: u64,
}

impl GroupIdAllocator {
    /// Create a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next group id.
    pub fn allocate(&mut self) -> String {
        self.issued += 1;
        self.issued.to_string()
    }

    /// Number of ids allocated so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued
    }
}

/// A confirmed set of byte-identical files.
///
/// Invariants: the set held at construction had two or more paths; the
/// master is excluded from `members`; the master is never deleted or
/// relinked.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// Opaque per-run group id.
    pub id: String,
    /// The canonical surviving file.
    pub master: PathBuf,
    /// Non-master duplicates, in case-insensitive sorted order.
    pub members: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Build a group from the paths of one confirmed duplicate set.
    ///
    /// Returns `None` unless the set has at least two paths.
    #[must_use]
    pub fn from_paths(id: String, mut paths: Vec<PathBuf>) -> Option<Self> {
        if paths.len() < 2 {
            return None;
        }
        sort_paths(&mut paths);
        let mut members = paths.into_iter();
        let master = members.next().expect("set has at least two paths");
        Some(Self {
            id,
            master,
            members: members.collect(),
        })
    }

    /// Number of non-master duplicates.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.members.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_case_insensitive() {
        let mut paths = vec![
            PathBuf::from("/data/Zebra.txt"),
            PathBuf::from("/data/apple.txt"),
            PathBuf::from("/data/Mango.txt"),
        ];
        sort_paths(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/data/apple.txt"),
                PathBuf::from("/data/Mango.txt"),
                PathBuf::from("/data/Zebra.txt"),
            ]
        );
    }

    #[test]
    fn test_sort_total_order_for_case_variants() {
        let mut paths = vec![PathBuf::from("/data/A.txt"), PathBuf::from("/data/a.txt")];
        sort_paths(&mut paths);
        let first = paths.clone();

        let mut paths = vec![PathBuf::from("/data/a.txt"), PathBuf::from("/data/A.txt")];
        sort_paths(&mut paths);
        assert_eq!(paths, first);
    }

    #[test]
    fn test_group_master_is_smallest() {
        let group = DuplicateGroup::from_paths(
            "1".to_string(),
            vec![
                PathBuf::from("/data/b.txt"),
                PathBuf::from("/data/A.txt"),
                PathBuf::from("/data/c.txt"),
            ],
        )
        .unwrap();

        assert_eq!(group.master, PathBuf::from("/data/A.txt"));
        assert_eq!(
            group.members,
            vec![PathBuf::from("/data/b.txt"), PathBuf::from("/data/c.txt")]
        );
        assert_eq!(group.duplicate_count(), 2);
    }

    #[test]
    fn test_group_requires_two_paths() {
        assert!(DuplicateGroup::from_paths("1".into(), vec![]).is_none());
        assert!(
            DuplicateGroup::from_paths("1".into(), vec![PathBuf::from("/only.txt")]).is_none()
        );
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let mut ids = GroupIdAllocator::new();
        assert_eq!(ids.allocate(), "1");
        assert_eq!(ids.allocate(), "2");
        assert_eq!(ids.allocate(), "3");
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn test_nfd_and_nfc_spellings_share_key() {
        // "é" composed vs decomposed
        let composed = PathBuf::from("/data/caf\u{e9}.txt");
        let decomposed = PathBuf::from("/data/cafe\u{301}.txt");
        assert_eq!(path_sort_key(&composed), path_sort_key(&decomposed));
    }
}
