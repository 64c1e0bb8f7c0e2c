//! Match criteria and criterion sets for the narrowing pipeline.
//!
//! Criteria are applied cheapest first so that metadata eliminates most
//! files before any byte of content is read. The order here is fixed; the
//! caller only chooses which subset participates.

/// A single match criterion.
///
/// Two records are duplicates only if they agree on every selected
/// criterion simultaneously. Equality is exact on every field; there is no
/// tolerance-based matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Criterion {
    /// Same (device, inode) pair: hard links to the same data.
    Inode,
    /// Same byte count.
    Size,
    /// Same base name before the last `.`.
    Name,
    /// Same extension after the last `.` (case-normalized).
    Extension,
    /// Bit-identical modification timestamp.
    ModTime,
    /// Same digest of the first and last N bytes (content probe).
    HeadTail,
    /// Same full-content digest (content probe, final arbiter).
    Checksum,
}

impl Criterion {
    /// All criteria in increasing cost order.
    pub const COST_ORDER: [Criterion; 7] = [
        Criterion::Inode,
        Criterion::Size,
        Criterion::Name,
        Criterion::Extension,
        Criterion::ModTime,
        Criterion::HeadTail,
        Criterion::Checksum,
    ];

    /// Whether this criterion needs a content probe before partitioning.
    #[must_use]
    pub fn needs_probe(self) -> bool {
        matches!(self, Criterion::HeadTail | Criterion::Checksum)
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Criterion::Inode => "inode",
            Criterion::Size => "size",
            Criterion::Name => "name",
            Criterion::Extension => "extension",
            Criterion::ModTime => "time",
            Criterion::HeadTail => "headtail",
            Criterion::Checksum => "checksum",
        };
        write!(f, "{name}")
    }
}

/// An ordered set of selected criteria.
///
/// Construction normalizes to cost order and deduplicates; selection order
/// on the command line never changes evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionSet {
    selected: Vec<Criterion>,
}

impl CriterionSet {
    /// Build a set from any iterator of criteria.
    #[must_use]
    pub fn from_criteria<I: IntoIterator<Item = Criterion>>(criteria: I) -> Self {
        let mut selected: Vec<Criterion> = Vec::new();
        for criterion in criteria {
            if !selected.contains(&criterion) {
                selected.push(criterion);
            }
        }
        selected.sort();
        Self { selected }
    }

    /// The default set when the caller selects nothing: size plus checksum.
    #[must_use]
    pub fn default_set() -> Self {
        Self::from_criteria([Criterion::Size, Criterion::Checksum])
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Whether a criterion is selected.
    #[must_use]
    pub fn contains(&self, criterion: Criterion) -> bool {
        self.selected.contains(&criterion)
    }

    /// Selected criteria in cost order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = Criterion> + '_ {
        self.selected.iter().copied()
    }

    /// Ensure the checksum criterion is present.
    ///
    /// The safety gate for hardlink/remove operations: they must never act
    /// on probabilistic-only matches. Returns `true` when checksum had to be
    /// added (so the caller can log the auto-enable).
    pub fn require_checksum(&mut self) -> bool {
        if self.contains(Criterion::Checksum) {
            return false;
        }
        self.selected.push(Criterion::Checksum);
        self.selected.sort();
        true
    }
}

impl std::fmt::Display for CriterionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.selected.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", names.join("+"))
    }
}
