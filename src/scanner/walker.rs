//! Directory indexer built on jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Indexer`] struct, which walks a directory tree
//! (optionally depth-bounded) and produces one [`FileRecord`] per regular,
//! non-empty file. Symbolic links are never indexed. Per-file metadata
//! failures are collected rather than aborting the walk.
//!
//! Records are emitted in sorted traversal order and carry a stable ordinal;
//! everything downstream that must be deterministic (master selection,
//! report order) keys off that ordinal.

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::SystemTime;

use jwalk::WalkDir;

use super::{FileId, FileRecord, IndexerConfig, ScanError};

/// Result of indexing a directory tree.
#[derive(Debug, Default)]
pub struct IndexOutcome {
    /// One record per indexed file, in stable traversal order.
    pub records: Vec<FileRecord>,
    /// Per-file errors encountered during the walk (non-fatal).
    pub errors: Vec<ScanError>,
}

impl IndexOutcome {
    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether no files were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Depth-bounded directory indexer.
///
/// Read-only: the walk never mutates the tree.
#[derive(Debug)]
pub struct Indexer {
    root: PathBuf,
    config: IndexerConfig,
}

impl Indexer {
    /// Create a new indexer for the given root directory.
    #[must_use]
    pub fn new(root: &Path, config: IndexerConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree and produce records for all regular files of size > 0
    /// within the configured depth.
    ///
    /// # Errors
    ///
    /// Fails with [`ScanError::InvalidDirectory`] when the root does not
    /// exist or is not a directory. Everything below that is per-file and
    /// lands in [`IndexOutcome::errors`].
    pub fn index(&self) -> Result<IndexOutcome, ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::InvalidDirectory(self.root.clone()));
        }

        let mut walk = WalkDir::new(&self.root)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false);
        if let Some(depth) = self.config.max_depth {
            walk = walk.max_depth(depth);
        }

        let mut outcome = IndexOutcome::default();

        for entry_result in walk {
            if self.is_shutdown_requested() {
                log::debug!("Indexer: shutdown requested, stopping traversal");
                break;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Indexer error for {}: {}", path.display(), e);
                    outcome.errors.push(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if path == self.root {
                continue;
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            // Symbolic links are never indexed as regular files.
            if file_type.is_symlink() {
                log::trace!("Skipping symlink: {}", path.display());
                continue;
            }

            let metadata = match std::fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(e) => {
                    outcome.errors.push(Self::io_error(&path, e));
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            let size = metadata.len();
            if size == 0 {
                log::debug!("Skipping empty file: {}", path.display());
                continue;
            }

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let file_id = FileId::from_metadata(&metadata);
            let ord = outcome.records.len();
            outcome
                .records
                .push(FileRecord::new(ord, path, size, modified, file_id));
        }

        log::info!(
            "Indexed {} files under {} ({} errors)",
            outcome.records.len(),
            self.root.display(),
            outcome.errors.len()
        );
        Ok(outcome)
    }

    fn io_error(path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File vanished during walk: {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }
}
