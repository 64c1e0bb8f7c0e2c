//! Tab-separated report files.
//!
//! Every report shares one fixed row layout, one row per file, columns in
//! fixed order: Size, Headtail, Checksum, Time, Inode, Name, Extension,
//! Path. Reports are written under the target directory for the full
//! duplicate list, the master/extra split, the moved-file log, and the
//! reference-copy log.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::scanner::{digest_hex, FileRecord};

/// Report with every duplicate, group by group.
pub const DUPLICATES_REPORT: &str = "dupsweep_duplicates.tsv";
/// Report with each group's master.
pub const MASTERS_REPORT: &str = "dupsweep_masters.tsv";
/// Report with each group's extras.
pub const EXTRAS_REPORT: &str = "dupsweep_extras.tsv";
/// Log of relocated files (paths point into the relocation directory).
pub const MOVED_REPORT: &str = "dupsweep_moved.tsv";
/// Log of files imported from a reference tree.
pub const COPIED_REPORT: &str = "dupsweep_copied.tsv";

/// Placeholder for a probe that never ran.
const UNPROBED: &str = "-";

/// Errors that can occur while writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during row serialization.
    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),
}

/// One report row. The field set is fixed at design time; no runtime
/// column lookup.
#[derive(Debug, Serialize)]
struct ReportRow {
    #[serde(rename = "Size")]
    size: u64,
    #[serde(rename = "Headtail")]
    headtail: String,
    #[serde(rename = "Checksum")]
    checksum: String,
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Inode")]
    inode: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Extension")]
    extension: String,
    #[serde(rename = "Path")]
    path: String,
}

impl ReportRow {
    fn from_record(record: &FileRecord) -> Self {
        let time: DateTime<Utc> = record.modified.into();
        Self {
            size: record.size,
            headtail: record.headtail.as_ref().map_or_else(
                || UNPROBED.to_string(),
                digest_hex,
            ),
            checksum: record.checksum.as_ref().map_or_else(
                || UNPROBED.to_string(),
                digest_hex,
            ),
            time: time.to_rfc3339(),
            inode: record
                .file_id
                .map_or_else(|| UNPROBED.to_string(), |id| id.ino.to_string()),
            name: record.name.clone(),
            extension: record.extension.to_string(),
            path: record.path.to_string_lossy().into_owned(),
        }
    }
}

/// Writer for the report files of one run.
#[derive(Debug)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Create a writer placing reports under `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Write one report file and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if writing or serialization fails.
    pub fn write_records(
        &self,
        file_name: &str,
        records: &[FileRecord],
    ) -> Result<PathBuf, ReportError> {
        let path = self.dir.join(file_name);
        let file = std::fs::File::create(&path)?;
        write_to(records, file)?;
        log::info!("Wrote {} rows to {}", records.len(), path.display());
        Ok(path)
    }
}

/// Write report rows to any writer.
///
/// # Errors
///
/// Returns [`ReportError`] if writing or serialization fails.
pub fn write_to<W: io::Write>(records: &[FileRecord], writer: W) -> Result<(), ReportError> {
    let mut tsv = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(writer);
    for record in records {
        tsv.serialize(ReportRow::from_record(record))?;
    }
    tsv.flush()?;
    Ok(())
}
