//! File operations over duplicate groups.
//!
//! This module provides the operation layer run after narrowing:
//! - Soft-link farm creation ([`links`])
//! - Reversible relocation and its inverse ([`relocate`], via [`codec`])
//! - Hard-linking or removing extras ([`extras`])
//! - Importing reference uniques ([`copy`])
//! - The confirmation gate for destructive batches ([`confirm`])
//!
//! Every batch proceeds file-by-file, tolerating individual failures
//! (permission errors, vanished files) by recording and continuing;
//! a batch never aborts halfway.

pub mod codec;
pub mod confirm;
pub mod copy;
pub mod extras;
pub mod links;
pub mod relocate;

use std::path::PathBuf;

use crate::scanner::FileRecord;

pub use codec::{CodecError, PathCodec, DELIMITER, MARKER};
pub use confirm::{confirm, confirm_from};

/// Subdirectory relocated duplicates are moved into.
pub const DUPLICATES_DIR: &str = "DUPLICATES";

/// Subdirectory the soft-link farm is created in.
pub const LINKS_DIR: &str = "LINKS_TO_DUPLICATES";

/// The file operation selected for a run (mutually exclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Report only; no mutation.
    List,
    /// Create a soft-link farm pointing at every duplicate.
    SoftLink,
    /// Relocate every duplicate into the relocation directory.
    Move,
    /// Restore previously relocated files to their original paths.
    MoveBack,
    /// Replace every extra with a hard link to its group's master.
    HardlinkExtras,
    /// Delete every extra, leaving each group's master untouched.
    RemoveExtras,
    /// Copy files unique to a reference tree into the target.
    CopyUniques(PathBuf),
}

impl FileOperation {
    /// Whether the operation mutates the filesystem and therefore gates on
    /// an explicit confirmation.
    #[must_use]
    pub fn is_destructive(&self) -> bool {
        !matches!(self, Self::List | Self::SoftLink)
    }

    /// Whether the operation acts on extras and therefore requires the
    /// checksum criterion in the effective match set.
    #[must_use]
    pub fn requires_checksum(&self) -> bool {
        matches!(self, Self::HardlinkExtras | Self::RemoveExtras)
    }

    /// Whether the operation needs the narrowing pipeline at all.
    #[must_use]
    pub fn needs_scan(&self) -> bool {
        !matches!(self, Self::MoveBack)
    }
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::SoftLink => "link",
            Self::Move => "move",
            Self::MoveBack => "move-back",
            Self::HardlinkExtras => "hardlink-extras",
            Self::RemoveExtras => "remove-extras",
            Self::CopyUniques(_) => "copy-uniques",
        };
        write!(f, "{name}")
    }
}

/// Results of a batch file operation.
#[derive(Debug, Default)]
pub struct OpOutcome {
    /// Records processed successfully, with paths updated where the
    /// operation relocated them.
    pub completed: Vec<FileRecord>,
    /// Per-file failures with their error messages.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes affected (moved, freed, or copied).
    pub bytes: u64,
}

impl OpOutcome {
    /// Number of successfully processed files.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.completed.len()
    }

    /// Number of failed files.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if every file was processed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the batch.
    #[must_use]
    pub fn summary(&self, verb: &str) -> String {
        if self.all_succeeded() {
            format!(
                "{verb} {} file(s), {} affected",
                self.success_count(),
                bytesize::ByteSize(self.bytes)
            )
        } else {
            format!(
                "{verb} {} file(s), {} failed, {} affected",
                self.success_count(),
                self.failure_count(),
                bytesize::ByteSize(self.bytes)
            )
        }
    }

    pub(crate) fn record_failure(&mut self, path: PathBuf, error: impl std::fmt::Display) {
        log::warn!("{}: {}", path.display(), error);
        self.failures.push((path, error.to_string()));
    }
}
