//! The dedup engine state machine.
//!
//! # Phases
//!
//! 1. **Preflight** (first `next()` call): root exists and is a
//!    directory, root is enumerable, volume supports hard links. Any
//!    failure yields one fatal error event and ends the stream.
//! 2. **Scanning**: one file per step. Read-only files are skipped up
//!    front with no event; every other file gets a partial fingerprint
//!    and a `Scanned` event, or an `Error` event if the read fails.
//! 3. **Refining**: partial-fingerprint buckets with two or more
//!    members are re-hashed in full, one file per step. Successful
//!    steps emit nothing; read failures emit `Error` events.
//! 4. **Linking**: one non-master duplicate per step, gated by the
//!    confirmation policy, emitting `Linked`, `Skipped`, or `Error`.
//!
//! The engine never suspends mid-operation: every `next()` call either
//! completes one file's unit of work or transitions between phases.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FatalError;
use crate::scanner::{probe_hard_link_support, walker::FileIter, Fingerprint, Hasher, Walker};

use super::groups::{path_sort_key, sort_paths, DuplicateGroup, GroupIdAllocator};
use super::{linker, DedupEvent, DedupOptions};

/// Lazy, pull-driven dedup engine.
///
/// Created by [`deduplicate`](super::deduplicate). All grouping state
/// is local to one engine value and recomputed fresh per run; nothing
/// persists between invocations.
pub struct DedupEngine {
    root: PathBuf,
    options: DedupOptions,
    hasher: Hasher,
    state: State,
}

enum State {
    Start,
    Scanning {
        files: FileIter,
        buckets: HashMap<Fingerprint, Vec<PathBuf>>,
    },
    Refining {
        pending: std::vec::IntoIter<PathBuf>,
        buckets: HashMap<Fingerprint, Vec<PathBuf>>,
        /// Fingerprints in the order their bucket reached two members.
        confirmed: Vec<Fingerprint>,
    },
    Linking {
        groups: std::vec::IntoIter<DuplicateGroup>,
        current: Option<ActiveGroup>,
    },
    Finished,
}

struct ActiveGroup {
    id: String,
    master: PathBuf,
    members: std::vec::IntoIter<PathBuf>,
}

impl DedupEngine {
    pub(crate) fn new(root: &Path, options: DedupOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
            hasher: Hasher::new(),
            state: State::Start,
        }
    }

    /// Precondition checks performed before any mutation.
    fn preflight(root: &Path) -> Result<(), FatalError> {
        let metadata = match fs::metadata(root) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FatalError::DirectoryNotFound(root.to_path_buf()));
            }
            Err(e) => {
                return Err(FatalError::PermissionDenied {
                    path: root.to_path_buf(),
                    source: e,
                });
            }
        };
        if !metadata.is_dir() {
            return Err(FatalError::NotADirectory(root.to_path_buf()));
        }
        fs::read_dir(root).map_err(|e| FatalError::PermissionDenied {
            path: root.to_path_buf(),
            source: e,
        })?;
        probe_hard_link_support(root).map_err(|e| FatalError::UnsupportedFilesystem {
            path: root.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Flatten candidate buckets into a deterministic refine order.
    fn refine_order(buckets: HashMap<Fingerprint, Vec<PathBuf>>) -> Vec<PathBuf> {
        let mut candidates: Vec<Vec<PathBuf>> = buckets
            .into_values()
            .filter(|bucket| bucket.len() >= 2)
            .collect();
        for bucket in &mut candidates {
            sort_paths(bucket);
        }
        candidates.sort_by(|a, b| {
            path_sort_key(&a[0])
                .cmp(&path_sort_key(&b[0]))
                .then_with(|| a[0].cmp(&b[0]))
        });
        candidates.into_iter().flatten().collect()
    }

    /// Process one non-master duplicate through the confirm/link gate.
    fn link_member(&mut self, id: &str, master: &Path, member: PathBuf) -> DedupEvent {
        if !self.options.confirmed(&member) {
            log::debug!("Confirmation denied for {}", member.display());
            return DedupEvent::skipped(member, id.to_string());
        }
        let mark_read_only = !self.options.do_not_mark_read_only;
        match linker::replace_with_link(master, &member, mark_read_only) {
            Ok(()) => DedupEvent::linked(member, id.to_string()),
            Err(e) => {
                log::warn!("{}", e);
                DedupEvent::error(member, Some(id.to_string()), e.to_string())
            }
        }
    }
}

impl Iterator for DedupEngine {
    type Item = DedupEvent;

    fn next(&mut self) -> Option<DedupEvent> {
        loop {
            match std::mem::replace(&mut self.state, State::Finished) {
                State::Start => match Self::preflight(&self.root) {
                    Ok(()) => {
                        log::info!("Starting dedup scan of {}", self.root.display());
                        let files =
                            Walker::new(&self.root, self.options.walker.clone()).into_iter();
                        self.state = State::Scanning {
                            files,
                            buckets: HashMap::new(),
                        };
                    }
                    Err(fatal) => {
                        log::error!("{}", fatal);
                        return Some(DedupEvent::error(
                            self.root.clone(),
                            None,
                            fatal.to_string(),
                        ));
                    }
                },

                State::Scanning { mut files, mut buckets } => match files.next() {
                    Some(entry) => {
                        if entry.read_only {
                            log::debug!("Skipping read-only file: {}", entry.path.display());
                            self.state = State::Scanning { files, buckets };
                            continue;
                        }
                        let event = match self.hasher.partial(&entry.path) {
                            Ok(fingerprint) => {
                                buckets
                                    .entry(fingerprint)
                                    .or_default()
                                    .push(entry.path.clone());
                                DedupEvent::scanned(entry.path)
                            }
                            Err(e) => {
                                log::warn!("{}", e);
                                DedupEvent::error(entry.path, None, e.to_string())
                            }
                        };
                        self.state = State::Scanning { files, buckets };
                        return Some(event);
                    }
                    None => {
                        let pending = Self::refine_order(buckets);
                        log::info!(
                            "Scan complete, {} file(s) share a partial fingerprint",
                            pending.len()
                        );
                        self.state = State::Refining {
                            pending: pending.into_iter(),
                            buckets: HashMap::new(),
                            confirmed: Vec::new(),
                        };
                    }
                },

                State::Refining {
                    mut pending,
                    mut buckets,
                    mut confirmed,
                } => match pending.next() {
                    Some(path) => match self.hasher.full(&path) {
                        Ok(fingerprint) => {
                            let bucket = buckets.entry(fingerprint).or_default();
                            bucket.push(path);
                            if bucket.len() == 2 {
                                confirmed.push(fingerprint);
                            }
                            self.state = State::Refining {
                                pending,
                                buckets,
                                confirmed,
                            };
                        }
                        Err(e) => {
                            log::warn!("{}", e);
                            let event = DedupEvent::error(path, None, e.to_string());
                            self.state = State::Refining {
                                pending,
                                buckets,
                                confirmed,
                            };
                            return Some(event);
                        }
                    },
                    None => {
                        let mut ids = GroupIdAllocator::new();
                        let groups: Vec<DuplicateGroup> = confirmed
                            .iter()
                            .filter_map(|fingerprint| {
                                let paths = buckets.remove(fingerprint)?;
                                DuplicateGroup::from_paths(ids.allocate(), paths)
                            })
                            .collect();
                        log::info!("Confirmed {} duplicate group(s)", groups.len());
                        self.state = State::Linking {
                            groups: groups.into_iter(),
                            current: None,
                        };
                    }
                },

                State::Linking { mut groups, current } => match current {
                    Some(mut active) => match active.members.next() {
                        Some(member) => {
                            let event = self.link_member(&active.id, &active.master, member);
                            self.state = State::Linking {
                                groups,
                                current: Some(active),
                            };
                            return Some(event);
                        }
                        None => {
                            self.state = State::Linking {
                                groups,
                                current: None,
                            };
                        }
                    },
                    None => match groups.next() {
                        Some(group) => {
                            log::debug!(
                                "Group {}: master {}, {} duplicate(s)",
                                group.id,
                                group.master.display(),
                                group.duplicate_count()
                            );
                            self.state = State::Linking {
                                groups,
                                current: Some(ActiveGroup {
                                    id: group.id,
                                    master: group.master,
                                    members: group.members.into_iter(),
                                }),
                            };
                        }
                        None => return None,
                    },
                },

                State::Finished => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::{deduplicate, DedupAction};
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    fn actions(events: &[DedupEvent], action: DedupAction) -> Vec<&DedupEvent> {
        events.iter().filter(|e| e.action == action).collect()
    }

    #[test]
    fn test_missing_root_is_single_fatal_error() {
        let options = DedupOptions::default().with_confirm_all(true);
        let events: Vec<_> =
            deduplicate(Path::new("/no/such/root/42"), options).collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, DedupAction::Error);
        assert!(events[0].error.as_ref().unwrap().contains("not found"));
    }

    #[test]
    fn test_file_root_is_not_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "plain.txt", b"x");

        let options = DedupOptions::default().with_confirm_all(true);
        let events: Vec<_> = deduplicate(&file, options).collect();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, DedupAction::Error);
        assert!(events[0].error.as_ref().unwrap().contains("not a directory"));
    }

    #[test]
    fn test_two_identical_one_distinct() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.txt", b"hello");
        write_file(&dir, "b.txt", b"hello");
        write_file(&dir, "c.txt", b"world");

        let options = DedupOptions::default().with_confirm_all(true);
        let events: Vec<_> = deduplicate(dir.path(), options).collect();

        assert_eq!(actions(&events, DedupAction::Scanned).len(), 3);

        let linked = actions(&events, DedupAction::Linked);
        assert_eq!(linked.len(), 1);
        // a.txt sorts before b.txt, so b.txt is the linked duplicate
        assert_eq!(linked[0].path.file_name().unwrap(), "b.txt");

        // c.txt participates in no group
        assert!(events
            .iter()
            .all(|e| e.path.file_name().unwrap() != "c.txt" || e.group_id.is_none()));
    }

    #[test]
    fn test_partial_collision_does_not_link() {
        use crate::scanner::PARTIAL_FINGERPRINT_LEN;

        let dir = TempDir::new().unwrap();
        let mut content = vec![0x55u8; PARTIAL_FINGERPRINT_LEN];
        content.extend_from_slice(b"tail one");
        write_file(&dir, "a.bin", &content);

        let mut content = vec![0x55u8; PARTIAL_FINGERPRINT_LEN];
        content.extend_from_slice(b"tail two");
        write_file(&dir, "b.bin", &content);

        let options = DedupOptions::default().with_confirm_all(true);
        let events: Vec<_> = deduplicate(dir.path(), options).collect();

        assert_eq!(actions(&events, DedupAction::Scanned).len(), 2);
        assert!(actions(&events, DedupAction::Linked).is_empty());
        assert!(actions(&events, DedupAction::Error).is_empty());
    }

    #[test]
    fn test_denied_confirmation_leaves_files_alone() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.txt", b"same");
        let b = write_file(&dir, "b.txt", b"same");

        let options = DedupOptions::default().with_confirm(Box::new(|_| false));
        let events: Vec<_> = deduplicate(dir.path(), options).collect();

        let skipped = actions(&events, DedupAction::Skipped);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].group_id.is_some());

        // Both files still on disk with distinct identities
        assert_ne!(
            crate::scanner::resolve_identity(&a).unwrap(),
            crate::scanner::resolve_identity(&b).unwrap()
        );
    }

    #[test]
    fn test_read_only_files_not_scanned() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.txt", b"same");
        let b = write_file(&dir, "b.txt", b"same");
        crate::scanner::set_read_only(&b, true).unwrap();

        let options = DedupOptions::default().with_confirm_all(true);
        let events: Vec<_> = deduplicate(dir.path(), options).collect();

        assert_eq!(actions(&events, DedupAction::Scanned).len(), 1);
        assert!(actions(&events, DedupAction::Linked).is_empty());

        crate::scanner::set_read_only(&b, false).unwrap();
    }

    #[test]
    fn test_group_ids_unique_within_run() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a1.txt", b"first pair");
        write_file(&dir, "a2.txt", b"first pair");
        write_file(&dir, "b1.txt", b"second pair!");
        write_file(&dir, "b2.txt", b"second pair!");

        let options = DedupOptions::default().with_confirm_all(true);
        let events: Vec<_> = deduplicate(dir.path(), options).collect();

        let linked = actions(&events, DedupAction::Linked);
        assert_eq!(linked.len(), 2);
        assert_ne!(linked[0].group_id, linked[1].group_id);
    }
}
