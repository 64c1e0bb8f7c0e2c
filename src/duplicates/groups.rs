//! Duplicate groups and the master/extra partition.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is a maximal set of records sharing identical values
//! for every active match criterion. Groups always have two or more members;
//! singletons are discarded by the filter, never represented here.
//!
//! Within a group exactly one record is the **master**: the first record in
//! stable input order (the order the indexer originally emitted them, never
//! re-sorted). This makes selection repeatable across runs on an unchanged
//! filesystem. All other members are **extras**, the candidates for
//! hard-linking or removal.

use crate::scanner::FileRecord;

/// A confirmed group of duplicate candidates.
///
/// Invariant: `records.len() >= 2`, sorted by ordinal.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    records: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a group from its members.
    ///
    /// Members are sorted by their stable input ordinal so master selection
    /// is independent of how the caller assembled the vector.
    ///
    /// # Panics
    ///
    /// Debug assertion fails for groups of fewer than two records.
    #[must_use]
    pub fn new(mut records: Vec<FileRecord>) -> Self {
        debug_assert!(records.len() >= 2, "a duplicate group has at least 2 files");
        records.sort_by_key(|r| r.ord);
        Self { records }
    }

    /// All members, master first.
    #[must_use]
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    /// Consume the group, yielding its members.
    #[must_use]
    pub fn into_records(self) -> Vec<FileRecord> {
        self.records
    }

    /// The one kept representative: first record in stable input order.
    #[must_use]
    pub fn master(&self) -> &FileRecord {
        &self.records[0]
    }

    /// Every member except the master.
    #[must_use]
    pub fn extras(&self) -> &[FileRecord] {
        &self.records[1..]
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// A group is never empty; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.records.iter().map(|r| r.size).sum()
    }

    /// Space reclaimable by eliminating the extras.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.extras().iter().map(|r| r.size).sum()
    }
}

/// Flatten groups into the full duplicate record list, group by group.
#[must_use]
pub fn all_records(groups: &[DuplicateGroup]) -> Vec<FileRecord> {
    groups
        .iter()
        .flat_map(|g| g.records().iter().cloned())
        .collect()
}

/// Collect every master across groups.
#[must_use]
pub fn masters(groups: &[DuplicateGroup]) -> Vec<FileRecord> {
    groups.iter().map(|g| g.master().clone()).collect()
}

/// Collect every extra across groups.
#[must_use]
pub fn extras(groups: &[DuplicateGroup]) -> Vec<FileRecord> {
    groups
        .iter()
        .flat_map(|g| g.extras().iter().cloned())
        .collect()
}
