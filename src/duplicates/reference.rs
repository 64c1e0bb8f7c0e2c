//! Reference-tree diffing.
//!
//! # Overview
//!
//! To import only truly new files from a reference tree, the whole pipeline
//! runs over the union of the target and reference indexes. Target records
//! are ordered ahead of reference records, so within any mixed group the
//! master is always a target file; reference members of such groups are
//! "reference extras" (their content already exists in the target) and the
//! remaining reference records are "reference uniques", the ones eligible
//! for copying.
//!
//! A group made solely of reference records means the content is duplicated
//! inside the reference tree but absent from the target: its master is still
//! unique (copied once), its extras are not.

use std::path::{Path, PathBuf};

use crate::scanner::{FileRecord, IndexerConfig, Indexer, ScanError};

use super::filter::{CandidateFilter, FilterError, Narrowed};

/// Errors from a reference diff run.
#[derive(thiserror::Error, Debug)]
pub enum ReferenceError {
    /// One of the two roots failed to index.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The narrowing run was aborted.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Outcome of diffing a reference tree against a target tree.
#[derive(Debug)]
pub struct ReferenceDiff {
    /// Root the reference records were indexed under.
    pub reference_root: PathBuf,
    /// Reference records whose content is not already present in the target.
    pub uniques: Vec<FileRecord>,
    /// Reference records whose content already exists in the target tree.
    pub extras: Vec<FileRecord>,
    /// The merged narrowing result the split was derived from.
    pub narrowed: Narrowed,
    /// Per-file scan errors from both indexing passes.
    pub scan_errors: Vec<ScanError>,
}

/// Runs the pipeline over the union of a target and a reference tree.
#[derive(Debug)]
pub struct ReferenceDiffEngine {
    target_root: PathBuf,
    reference_root: PathBuf,
    indexer_config: IndexerConfig,
}

impl ReferenceDiffEngine {
    /// Create an engine for the given pair of roots.
    #[must_use]
    pub fn new(target_root: &Path, reference_root: &Path, indexer_config: IndexerConfig) -> Self {
        Self {
            target_root: target_root.to_path_buf(),
            reference_root: reference_root.to_path_buf(),
            indexer_config,
        }
    }

    /// Index both trees, narrow the merged set, and split the reference
    /// records into uniques and extras.
    ///
    /// # Errors
    ///
    /// Fails when either root is invalid or the run is interrupted.
    pub fn diff(&self, filter: &CandidateFilter) -> Result<ReferenceDiff, ReferenceError> {
        let target = Indexer::new(&self.target_root, self.indexer_config.clone()).index()?;
        let mut reference =
            Indexer::new(&self.reference_root, self.indexer_config.clone()).index()?;

        // Target records keep their ordinals; reference ordinals are offset
        // past them so target files always win mastership.
        let target_count = target.records.len();
        for (i, record) in reference.records.iter_mut().enumerate() {
            record.ord = target_count + i;
        }
        let reference_ordinal_base = target_count;

        log::info!(
            "Reference diff: {} target files, {} reference files",
            target_count,
            reference.records.len()
        );

        let mut merged = target.records;
        let all_reference: Vec<FileRecord> = reference.records.clone();
        merged.extend(reference.records);

        let narrowed = filter.narrow(merged)?;

        // Reference records that ended up as some group's extra already
        // exist (per the matched criteria) somewhere ahead of them.
        let mut extra_ords: Vec<usize> = narrowed
            .groups
            .iter()
            .flat_map(|g| g.extras().iter().map(|r| r.ord))
            .filter(|&ord| ord >= reference_ordinal_base)
            .collect();
        extra_ords.sort_unstable();

        let (extras, uniques): (Vec<FileRecord>, Vec<FileRecord>) = all_reference
            .into_iter()
            .partition(|r| extra_ords.binary_search(&r.ord).is_ok());

        log::info!(
            "Reference diff: {} uniques to import, {} already present",
            uniques.len(),
            extras.len()
        );

        let mut scan_errors = target.errors;
        scan_errors.extend(reference.errors);

        Ok(ReferenceDiff {
            reference_root: self.reference_root.clone(),
            uniques,
            extras,
            narrowed,
            scan_errors,
        })
    }
}
