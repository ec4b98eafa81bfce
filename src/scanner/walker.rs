//! Directory walker implementation using walkdir for sequential traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and yielding the regular files beneath it. The walk is strictly
//! single-threaded and deterministic: children are visited in file-name
//! order, so two walks over the same tree yield the same sequence.
//!
//! # Fault tolerance
//!
//! A single unreadable subdirectory must not fail the whole walk. Errors
//! from directory enumeration are logged at warn level and discarded, and
//! the walk continues with the remaining siblings.
//!
//! # Symbolic links
//!
//! Symlinks are never followed. A symlinked directory is not descended
//! into (preventing cycles and cross-volume traversal) and symlinked
//! files are not yielded; hard links only make sense against regular
//! files on the same volume.
//!
//! # Example
//!
//! ```no_run
//! use dupelink::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! for file in walker {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::WalkDir;

use super::{FileEntry, WalkerConfig};

/// Directory walker for sequential file discovery.
///
/// Yields one [`FileEntry`] per regular file beneath the root, in
/// deterministic (file-name sorted) order.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Build gitignore matcher from config patterns and .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        // Add local .gitignore if it exists
        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        // Add custom patterns from config
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) => {
                if gitignore.is_empty() {
                    None
                } else {
                    Some(gitignore)
                }
            }
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }
}

impl IntoIterator for Walker {
    type Item = FileEntry;
    type IntoIter = FileIter;

    fn into_iter(self) -> Self::IntoIter {
        let gitignore = self.build_gitignore();
        let inner = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();
        FileIter {
            root: self.root,
            gitignore,
            inner,
        }
    }
}

/// Owned iterator over the regular files beneath a walker's root.
pub struct FileIter {
    root: PathBuf,
    gitignore: Option<Gitignore>,
    inner: walkdir::IntoIter,
}

impl FileIter {
    /// Check if a path should be ignored based on configured patterns.
    ///
    /// Gitignore matching expects paths relative to the root and uses
    /// forward slashes even on Windows.
    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let Some(ref gi) = self.gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        let path_str = relative_path.to_string_lossy();
        let normalized_path = if cfg!(windows) {
            path_str.replace('\\', "/")
        } else {
            path_str.into_owned()
        };
        gi.matched(normalized_path, is_dir).is_ignore()
    }
}

impl Iterator for FileIter {
    type Item = FileEntry;

    fn next(&mut self) -> Option<FileEntry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    // Per-directory enumeration failures are swallowed so
                    // one unreadable subtree cannot abort the scan.
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    continue;
                }
            };

            let path = entry.path();

            // Skip the root directory itself
            if path == self.root {
                continue;
            }

            let file_type = entry.file_type();

            if file_type.is_dir() {
                if self.should_ignore(path, true) {
                    log::trace!("Ignoring directory: {}", path.display());
                    self.inner.skip_current_dir();
                }
                continue;
            }

            // With follow_links(false) a symlinked directory surfaces here
            // as a symlink entry and is never descended into.
            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", path.display());
                continue;
            }

            if !file_type.is_file() {
                log::trace!("Skipping non-regular file: {}", path.display());
                continue;
            }

            if self.should_ignore(path, false) {
                log::trace!("Ignoring file: {}", path.display());
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("Failed to stat {}: {}", path.display(), e);
                    continue;
                }
            };

            return Some(FileEntry {
                path: path.to_path_buf(),
                size: metadata.len(),
                read_only: metadata.permissions().readonly(),
                is_symlink: false,
            });
        }
    }
}
