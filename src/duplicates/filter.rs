//! Progressive candidate narrowing.
//!
//! # Overview
//!
//! The filter refines a record set into duplicate groups one criterion at a
//! time, cheapest first:
//!
//! 1. **Inode pass (always first, implicit).** If inode matching was
//!    requested, group by inode and stop: identical inode already implies
//!    identical content. Otherwise collapse hard links to one representative
//!    per inode so multiple links to the same data are never double-counted.
//! 2. **Metadata and probe passes.** Each selected criterion splits every
//!    current partition by its typed key, discards singleton partitions, and
//!    keeps the union of survivors. Splitting inside partitions (rather than
//!    regrouping the whole set) preserves intersection semantics: two
//!    records stay together only when they agree on every criterion applied
//!    so far.
//! 3. The head/tail and checksum criteria run their content probe over
//!    exactly the records that reached that stage; records that fail the
//!    probe are dropped and the failure recorded. This ordering is the core
//!    performance property: cheap metadata eliminates most files before any
//!    byte is read.
//!
//! A pass that leaves zero candidates is the normal "no duplicates found"
//! outcome, not an error.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::scanner::{FileId, FileRecord, ProbeError, Prober};

use super::criteria::{Criterion, CriterionSet};
use super::groups::DuplicateGroup;

/// Errors that abort the whole narrowing run.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// The run was interrupted by a shutdown signal.
    #[error("Interrupted by shutdown signal")]
    Interrupted,
}

/// Statistics for one narrowing pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStats {
    /// Criterion the pass partitioned on.
    pub criterion: Criterion,
    /// Records entering the pass.
    pub input: usize,
    /// Records surviving singleton elimination.
    pub survivors: usize,
    /// Partitions of size >= 2 after the pass.
    pub groups: usize,
}

impl PassStats {
    /// Percentage of records eliminated by this pass.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input == 0 {
            0.0
        } else {
            ((self.input - self.survivors) as f64 / self.input as f64) * 100.0
        }
    }
}

/// Statistics for a whole narrowing run.
#[derive(Debug, Clone, Default)]
pub struct NarrowStats {
    /// Records entering the pipeline.
    pub input_records: usize,
    /// Hard links collapsed away before the first pass.
    pub hardlinks_collapsed: usize,
    /// Per-pass statistics, in execution order.
    pub passes: Vec<PassStats>,
}

/// Result of a narrowing run.
#[derive(Debug, Default)]
pub struct Narrowed {
    /// Final duplicate groups, ordered by the master's input ordinal.
    pub groups: Vec<DuplicateGroup>,
    /// Pipeline statistics.
    pub stats: NarrowStats,
    /// Probe failures; the affected records were dropped, not fatal.
    pub probe_failures: Vec<ProbeError>,
}

impl Narrowed {
    /// Whether the run found any duplicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of records across all groups.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }
}

/// The narrowing engine.
#[derive(Debug)]
pub struct CandidateFilter {
    criteria: CriterionSet,
    prober: Prober,
}

impl CandidateFilter {
    /// Create a filter over the given criteria, probing with `prober`.
    #[must_use]
    pub fn new(criteria: CriterionSet, prober: Prober) -> Self {
        Self { criteria, prober }
    }

    /// The criteria this filter applies.
    #[must_use]
    pub fn criteria(&self) -> &CriterionSet {
        &self.criteria
    }

    /// Narrow a record set down to its duplicate groups.
    ///
    /// Each stage takes the prior stage's output set and returns a new set;
    /// no shared state is mutated between stages.
    ///
    /// # Errors
    ///
    /// Only [`FilterError::Interrupted`]; per-file probe failures are
    /// recorded in the result instead.
    pub fn narrow(&self, records: Vec<FileRecord>) -> Result<Narrowed, FilterError> {
        let mut result = Narrowed {
            stats: NarrowStats {
                input_records: records.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        // Inode pass: explicit hard-link discovery terminates the pipeline.
        if self.criteria.contains(Criterion::Inode) {
            let input = records.len();
            // Records without a platform identity cannot be hard links.
            let identified: Vec<FileRecord> =
                records.into_iter().filter(|r| r.file_id.is_some()).collect();
            let partitions = split_partition(identified, |r| r.file_id);
            result
                .stats
                .passes
                .push(pass_stats(Criterion::Inode, input, &partitions));
            result.groups = finish(partitions);
            log_summary(&result);
            return Ok(result);
        }

        let (records, collapsed) = collapse_hardlinks(records);
        result.stats.hardlinks_collapsed = collapsed;
        if collapsed > 0 {
            log::debug!("Collapsed {collapsed} hard links to single representatives");
        }

        // One partition to start; every pass refines within partitions.
        let mut partitions = vec![records];

        for criterion in self.criteria.iter() {
            let input: usize = partitions.iter().map(Vec::len).sum();
            if input == 0 {
                break;
            }

            if criterion.needs_probe() {
                partitions = self.probe_partitions(criterion, partitions, &mut result)?;
            }

            partitions = match criterion {
                Criterion::Inode => unreachable!("inode pass handled above"),
                Criterion::Size => refine(partitions, |r| r.size),
                Criterion::Name => refine(partitions, |r| r.name.clone()),
                Criterion::Extension => refine(partitions, |r| r.extension.clone()),
                Criterion::ModTime => refine(partitions, |r| r.modified),
                Criterion::HeadTail => refine(partitions, |r| r.headtail),
                Criterion::Checksum => refine(partitions, |r| r.checksum),
            };

            let pass = pass_stats(criterion, input, &partitions);
            log::info!(
                "Pass {criterion}: {} -> {} candidates in {} groups ({:.1}% eliminated)",
                pass.input,
                pass.survivors,
                pass.groups,
                pass.elimination_rate()
            );
            result.stats.passes.push(pass);
        }

        result.groups = finish(partitions);
        log_summary(&result);
        Ok(result)
    }

    /// Run the probe a criterion requires over the current survivors only.
    ///
    /// All surviving records are probed as one batch (one bounded pool per
    /// phase), then handed back to their partitions; ordinals are unique,
    /// so the mapping is exact.
    fn probe_partitions(
        &self,
        criterion: Criterion,
        partitions: Vec<Vec<FileRecord>>,
        result: &mut Narrowed,
    ) -> Result<Vec<Vec<FileRecord>>, FilterError> {
        let partition_count = partitions.len();
        let mut slot_by_ord: HashMap<usize, usize> = HashMap::new();
        let mut flat = Vec::new();
        for (slot, partition) in partitions.into_iter().enumerate() {
            for record in partition {
                slot_by_ord.insert(record.ord, slot);
                flat.push(record);
            }
        }

        let batch = match criterion {
            Criterion::HeadTail => self.prober.headtail_batch(flat),
            Criterion::Checksum => self.prober.checksum_batch(flat),
            _ => unreachable!("only probe criteria reach here"),
        };
        if batch.interrupted {
            return Err(FilterError::Interrupted);
        }
        result.probe_failures.extend(batch.failures);

        let mut rebuilt: Vec<Vec<FileRecord>> = (0..partition_count).map(|_| Vec::new()).collect();
        for record in batch.probed {
            let slot = slot_by_ord[&record.ord];
            rebuilt[slot].push(record);
        }
        Ok(rebuilt)
    }
}

/// Keep exactly one representative record per inode.
///
/// Records without a file identity pass through untouched. The lowest
/// ordinal wins, preserving stable input order.
fn collapse_hardlinks(records: Vec<FileRecord>) -> (Vec<FileRecord>, usize) {
    let mut seen: HashSet<FileId> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut collapsed = 0usize;

    for record in records {
        match record.file_id {
            Some(id) => {
                if seen.insert(id) {
                    kept.push(record);
                } else {
                    collapsed += 1;
                }
            }
            None => kept.push(record),
        }
    }
    (kept, collapsed)
}

/// Split every partition by a typed key, dropping singleton partitions.
fn refine<K, F>(partitions: Vec<Vec<FileRecord>>, key_fn: F) -> Vec<Vec<FileRecord>>
where
    K: Eq + Hash,
    F: Copy + Fn(&FileRecord) -> K,
{
    partitions
        .into_iter()
        .flat_map(|partition| split_partition(partition, key_fn))
        .collect()
}

/// Partition one record set by key, keeping only partitions of size >= 2.
fn split_partition<K, F>(records: Vec<FileRecord>, key_fn: F) -> Vec<Vec<FileRecord>>
where
    K: Eq + Hash,
    F: Fn(&FileRecord) -> K,
{
    let mut by_key: HashMap<K, Vec<FileRecord>> = HashMap::new();
    for record in records {
        by_key.entry(key_fn(&record)).or_default().push(record);
    }
    by_key
        .into_values()
        .filter(|members| members.len() >= 2)
        .collect()
}

fn pass_stats(criterion: Criterion, input: usize, partitions: &[Vec<FileRecord>]) -> PassStats {
    PassStats {
        criterion,
        input,
        survivors: partitions.iter().map(Vec::len).sum(),
        groups: partitions.len(),
    }
}

/// Turn final partitions into groups ordered by the master's ordinal.
fn finish(partitions: Vec<Vec<FileRecord>>) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = partitions
        .into_iter()
        .filter(|members| members.len() >= 2)
        .map(DuplicateGroup::new)
        .collect();
    groups.sort_by_key(|g| g.master().ord);
    groups
}

fn log_summary(result: &Narrowed) {
    if result.is_empty() {
        log::info!("No duplicates found");
    } else {
        log::info!(
            "Narrowed {} records to {} duplicates in {} groups",
            result.stats.input_records,
            result.record_count(),
            result.groups.len()
        );
    }
}
