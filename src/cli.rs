//! Command-line interface definitions.
//!
//! All arguments are defined with the clap derive API: one positional
//! target directory, a mutually exclusive depth selection, any combination
//! of match-criterion flags, and exactly one file-operation flag.
//!
//! # Example
//!
//! ```bash
//! # List duplicates by size + checksum (the default criteria)
//! dupsweep ~/Downloads
//!
//! # Match on name and modification time, two levels deep
//! dupsweep ~/Downloads --match-name --match-time --depth 2
//!
//! # Relocate duplicates, then undo
//! dupsweep ~/Downloads --move
//! dupsweep ~/Downloads --move-back
//!
//! # Remove extras (checksum matching is auto-enabled)
//! dupsweep ~/Downloads --remove-extras
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::duplicates::{Criterion, CriterionSet};
use crate::ops::FileOperation;

/// Progressive duplicate file finder with safe, reversible file operations.
///
/// dupsweep narrows duplicate candidates with cheap metadata comparisons
/// before reading any file content, then runs the selected operation over
/// the duplicate groups found.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory tree to search for duplicates
    #[arg(value_name = "DIR")]
    pub target: PathBuf,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Emit fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Limit the search depth below the target directory (>= 1)
    #[arg(
        short = 'd',
        long,
        value_name = "N",
        value_parser = clap::value_parser!(u64).range(1..),
        conflicts_with = "flat"
    )]
    pub depth: Option<u64>,

    /// Search only the target directory itself (same as --depth 1)
    #[arg(long)]
    pub flat: bool,

    /// Match files that are hard links to the same data (terminal criterion)
    #[arg(
        long,
        conflicts_with_all = [
            "match_size", "match_name", "match_ext", "match_time",
            "match_headtail", "match_checksum",
            "hardlink_extras", "remove_extras",
        ]
    )]
    pub match_inode: bool,

    /// Match files with the same size
    #[arg(long)]
    pub match_size: bool,

    /// Match files with the same base name (before the last dot)
    #[arg(long)]
    pub match_name: bool,

    /// Match files with the same extension (case-insensitive)
    #[arg(long)]
    pub match_ext: bool,

    /// Match files with the same modification time (exact)
    #[arg(long)]
    pub match_time: bool,

    /// Match files whose first and last bytes digest equally
    #[arg(long)]
    pub match_headtail: bool,

    /// Match files with the same full-content checksum
    #[arg(long)]
    pub match_checksum: bool,

    /// Bytes sampled from each file end by the headtail probe
    #[arg(long, value_name = "N")]
    pub headtail_bytes: Option<usize>,

    /// Number of I/O threads for the probe phases
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// List duplicates and write the reports (default operation)
    #[arg(long, group = "operation")]
    pub list: bool,

    /// Create a soft-link farm pointing at every duplicate
    #[arg(long, group = "operation")]
    pub link: bool,

    /// Move every duplicate into the DUPLICATES directory (reversible)
    #[arg(long = "move", group = "operation")]
    pub move_files: bool,

    /// Restore previously moved files to their original paths
    #[arg(long, group = "operation")]
    pub move_back: bool,

    /// Replace each group's extras with hard links to its master
    #[arg(long, group = "operation")]
    pub hardlink_extras: bool,

    /// Delete each group's extras, keeping the master
    #[arg(long, group = "operation")]
    pub remove_extras: bool,

    /// Copy files unique to REF_DIR into the target tree
    #[arg(long, group = "operation", value_name = "REF_DIR")]
    pub copy_uniques: Option<PathBuf>,

    /// Skip confirmation prompts (for scripted use)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Cli {
    /// The selected match criteria, in cost order. Empty when no criterion
    /// flag was given; the application substitutes the default set.
    #[must_use]
    pub fn criteria(&self) -> CriterionSet {
        let flags = [
            (self.match_inode, Criterion::Inode),
            (self.match_size, Criterion::Size),
            (self.match_name, Criterion::Name),
            (self.match_ext, Criterion::Extension),
            (self.match_time, Criterion::ModTime),
            (self.match_headtail, Criterion::HeadTail),
            (self.match_checksum, Criterion::Checksum),
        ];
        CriterionSet::from_criteria(
            flags
                .into_iter()
                .filter_map(|(set, criterion)| set.then_some(criterion)),
        )
    }

    /// The selected file operation (list when no operation flag was given).
    #[must_use]
    pub fn operation(&self) -> FileOperation {
        if self.link {
            FileOperation::SoftLink
        } else if self.move_files {
            FileOperation::Move
        } else if self.move_back {
            FileOperation::MoveBack
        } else if self.hardlink_extras {
            FileOperation::HardlinkExtras
        } else if self.remove_extras {
            FileOperation::RemoveExtras
        } else if let Some(reference) = &self.copy_uniques {
            FileOperation::CopyUniques(reference.clone())
        } else {
            FileOperation::List
        }
    }

    /// The effective depth bound, folding `--flat` into `--depth 1`.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        if self.flat {
            Some(1)
        } else {
            self.depth.map(|d| d as usize)
        }
    }
}
