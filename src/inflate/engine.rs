//! The inflate engine state machine.
//!
//! # Phases
//!
//! 1. **Preflight** (first `next()` call): root exists, is a directory,
//!    and is enumerable. Any failure yields one fatal error event and
//!    ends the stream. No hard-link probe: inflating only ever breaks
//!    links, so a volume that cannot create them is still fair game.
//! 2. **Scanning**: one file per step, emitting a `Scanned` event per
//!    regular file. Files whose identity resolves are bucketed; files
//!    without an identity are excluded from grouping with no error.
//! 3. **Unlinking**: one non-master group member per step, gated by the
//!    confirmation policy, emitting `Inflated`, `Skipped`, or `Error`.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::FatalError;
use crate::scanner::{resolve_identity, walker::FileIter, FileIdentity, Walker};

use crate::dedup::groups::GroupIdAllocator;

use super::{unlinker, IdentityGroup, InflateEvent, InflateOptions};

/// Lazy, pull-driven inflate engine.
///
/// Created by [`inflate`](super::inflate). Grouping state is local to
/// one engine value; nothing persists between invocations.
pub struct InflateEngine {
    root: PathBuf,
    options: InflateOptions,
    state: State,
}

enum State {
    Start,
    Scanning {
        files: FileIter,
        buckets: HashMap<FileIdentity, Vec<PathBuf>>,
        /// Identities in the order their bucket reached two members.
        confirmed: Vec<FileIdentity>,
    },
    Unlinking {
        groups: std::vec::IntoIter<IdentityGroup>,
        current: Option<ActiveGroup>,
    },
    Finished,
}

struct ActiveGroup {
    id: String,
    master: PathBuf,
    members: std::vec::IntoIter<PathBuf>,
}

impl InflateEngine {
    pub(crate) fn new(root: &Path, options: InflateOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
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
        Ok(())
    }

    /// Process one non-master group member through the confirm/restore
    /// gate.
    fn unlink_member(&mut self, id: &str, master: &Path, member: PathBuf) -> InflateEvent {
        if !self.options.confirmed(&member) {
            log::debug!("Confirmation denied for {}", member.display());
            return InflateEvent::skipped(member, id.to_string());
        }
        match unlinker::restore_copy(master, &member) {
            Ok(()) => InflateEvent::inflated(member, id.to_string()),
            Err(e) => {
                log::warn!("{}", e);
                InflateEvent::error(member, Some(id.to_string()), e.to_string())
            }
        }
    }
}

impl Iterator for InflateEngine {
    type Item = InflateEvent;

    fn next(&mut self) -> Option<InflateEvent> {
        loop {
            match std::mem::replace(&mut self.state, State::Finished) {
                State::Start => match Self::preflight(&self.root) {
                    Ok(()) => {
                        log::info!("Starting inflate scan of {}", self.root.display());
                        let files =
                            Walker::new(&self.root, self.options.walker.clone()).into_iter();
                        self.state = State::Scanning {
                            files,
                            buckets: HashMap::new(),
                            confirmed: Vec::new(),
                        };
                    }
                    Err(fatal) => {
                        log::error!("{}", fatal);
                        return Some(InflateEvent::error(
                            self.root.clone(),
                            None,
                            fatal.to_string(),
                        ));
                    }
                },

                State::Scanning {
                    mut files,
                    mut buckets,
                    mut confirmed,
                } => match files.next() {
                    Some(entry) => {
                        // No-identity files are excluded from grouping,
                        // not reported as errors
                        if let Some(identity) = resolve_identity(&entry.path) {
                            let bucket = buckets.entry(identity).or_default();
                            bucket.push(entry.path.clone());
                            if bucket.len() == 2 {
                                confirmed.push(identity);
                            }
                        }
                        let event = InflateEvent::scanned(entry.path);
                        self.state = State::Scanning {
                            files,
                            buckets,
                            confirmed,
                        };
                        return Some(event);
                    }
                    None => {
                        let mut ids = GroupIdAllocator::new();
                        let groups: Vec<IdentityGroup> = confirmed
                            .iter()
                            .filter_map(|identity| {
                                let paths = buckets.remove(identity)?;
                                IdentityGroup::from_paths(ids.allocate(), paths)
                            })
                            .collect();
                        log::info!("Found {} hard-link group(s)", groups.len());
                        self.state = State::Unlinking {
                            groups: groups.into_iter(),
                            current: None,
                        };
                    }
                },

                State::Unlinking { mut groups, current } => match current {
                    Some(mut active) => match active.members.next() {
                        Some(member) => {
                            let event = self.unlink_member(&active.id, &active.master, member);
                            self.state = State::Unlinking {
                                groups,
                                current: Some(active),
                            };
                            return Some(event);
                        }
                        None => {
                            self.state = State::Unlinking {
                                groups,
                                current: None,
                            };
                        }
                    },
                    None => match groups.next() {
                        Some(group) => {
                            log::debug!(
                                "Group {}: master {}, {} sibling(s)",
                                group.id,
                                group.master.display(),
                                group.member_count()
                            );
                            self.state = State::Unlinking {
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
