//! Content probes: head/tail byte sampling and full-content checksums.
//!
//! # Overview
//!
//! Probes are the expensive half of duplicate detection and run only on the
//! records that survived metadata narrowing. Two probes exist:
//!
//! - **Head/tail**: digest of exactly the first N and last N bytes of the
//!   file (N configurable, default 10). A cheap proxy for content equality.
//! - **Checksum**: BLAKE3 digest over the whole byte stream, the strongest
//!   equality signal used. Memory-mapped and rayon-parallel for large files.
//!
//! Batch variants run on a bounded rayon pool (disk thrash guard, same
//! pattern as the walk phases) and re-sort survivors by ordinal so that
//! parallel completion order never leaks into master selection.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::{Digest, FileRecord, ProbeError};

/// Default head/tail window in bytes.
pub const DEFAULT_HEADTAIL_BYTES: usize = 10;

/// Default number of I/O threads for parallel probing.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Configuration for the prober.
#[derive(Debug, Clone)]
pub struct ProberConfig {
    /// Bytes sampled from each end of the file for the head/tail probe.
    pub headtail_bytes: usize,
    /// Number of I/O threads for parallel probing.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            headtail_bytes: DEFAULT_HEADTAIL_BYTES,
            io_threads: DEFAULT_IO_THREADS,
            shutdown_flag: None,
        }
    }
}

impl ProberConfig {
    /// Set the head/tail window size.
    #[must_use]
    pub fn with_headtail_bytes(mut self, bytes: usize) -> Self {
        self.headtail_bytes = bytes.max(1);
        self
    }

    /// Set the I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

/// Outcome of a batch probe pass.
#[derive(Debug, Default)]
pub struct ProbeBatch {
    /// Records whose probe succeeded, re-sorted by ordinal.
    pub probed: Vec<FileRecord>,
    /// Per-file probe failures; the records were dropped from the set.
    pub failures: Vec<ProbeError>,
    /// Whether the pass stopped early on the shutdown flag.
    pub interrupted: bool,
}

/// Content prober with a bounded I/O pool.
#[derive(Debug, Clone)]
pub struct Prober {
    config: ProberConfig,
}

impl Prober {
    /// Create a prober with the given configuration.
    #[must_use]
    pub fn new(config: ProberConfig) -> Self {
        Self { config }
    }

    /// Create a prober with default settings.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ProberConfig::default())
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Digest the first N and last N bytes of the file.
    ///
    /// For files smaller than 2N bytes the two windows overlap; each end
    /// reads whatever bytes exist there, so the digest is still well defined.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the file vanished or cannot be read.
    pub fn headtail(&self, path: &Path) -> Result<Digest, ProbeError> {
        let n = self.config.headtail_bytes as u64;
        let mut file = File::open(path).map_err(|e| ProbeError::from_io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| ProbeError::from_io(path, e))?
            .len();

        let mut head = vec![0u8; n.min(len) as usize];
        file.read_exact(&mut head)
            .map_err(|e| ProbeError::from_io(path, e))?;

        let tail_start = len.saturating_sub(n);
        file.seek(SeekFrom::Start(tail_start))
            .map_err(|e| ProbeError::from_io(path, e))?;
        let mut tail = vec![0u8; (len - tail_start) as usize];
        file.read_exact(&mut tail)
            .map_err(|e| ProbeError::from_io(path, e))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&head);
        hasher.update(&tail);
        Ok(*hasher.finalize().as_bytes())
    }

    /// Digest the file's full content.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] if the file vanished or cannot be read.
    pub fn checksum(&self, path: &Path) -> Result<Digest, ProbeError> {
        let mut hasher = blake3::Hasher::new();
        hasher
            .update_mmap_rayon(path)
            .map_err(|e| ProbeError::from_io(path, e))?;
        Ok(*hasher.finalize().as_bytes())
    }

    /// Run the head/tail probe over a record set on the bounded pool.
    #[must_use]
    pub fn headtail_batch(&self, records: Vec<FileRecord>) -> ProbeBatch {
        self.batch(records, "headtail", |prober, record| {
            prober.headtail(&record.path).map(|digest| {
                record.headtail = Some(digest);
            })
        })
    }

    /// Run the checksum probe over a record set on the bounded pool.
    #[must_use]
    pub fn checksum_batch(&self, records: Vec<FileRecord>) -> ProbeBatch {
        self.batch(records, "checksum", |prober, record| {
            prober.checksum(&record.path).map(|digest| {
                record.checksum = Some(digest);
            })
        })
    }

    fn batch<F>(&self, records: Vec<FileRecord>, phase: &str, probe: F) -> ProbeBatch
    where
        F: Send + Sync + Fn(&Self, &mut FileRecord) -> Result<(), ProbeError>,
    {
        if records.is_empty() {
            return ProbeBatch::default();
        }

        log::info!("Probing {} files ({} pass)", records.len(), phase);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
            .unwrap_or_else(|_| {
                log::warn!(
                    "Failed to create custom thread pool, using global pool with {} threads",
                    rayon::current_num_threads()
                );
                rayon::ThreadPoolBuilder::new().build().unwrap()
            });

        let results: Vec<Result<Option<FileRecord>, ProbeError>> = pool.install(|| {
            records
                .into_par_iter()
                .map(|mut record| {
                    if self.is_shutdown_requested() {
                        return Ok(None);
                    }
                    match probe(self, &mut record) {
                        Ok(()) => Ok(Some(record)),
                        Err(e) => {
                            log::warn!("Probe failed ({phase}): {e}");
                            Err(e)
                        }
                    }
                })
                .collect()
        });

        let mut batch = ProbeBatch {
            interrupted: self.is_shutdown_requested(),
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(Some(record)) => batch.probed.push(record),
                Ok(None) => {}
                Err(e) => batch.failures.push(e),
            }
        }

        // Parallel completion order is arbitrary; restore input order.
        batch.probed.sort_by_key(|r| r.ord);

        log::debug!(
            "Probe pass {phase} complete: {} probed, {} failed",
            batch.probed.len(),
            batch.failures.len()
        );
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    fn record(ord: usize, path: &Path) -> FileRecord {
        let meta = std::fs::metadata(path).unwrap();
        FileRecord::new(
            ord,
            path.to_path_buf(),
            meta.len(),
            meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            None,
        )
    }

    #[test]
    fn test_headtail_equal_for_same_ends() {
        let dir = TempDir::new().unwrap();
        // Same first 10 and last 10 bytes, different middle.
        let a = write_file(dir.path(), "a.bin", b"0123456789-middle-A-9876543210");
        let b = write_file(dir.path(), "b.bin", b"0123456789-middle-B-9876543210");

        let prober = Prober::with_defaults();
        assert_eq!(
            prober.headtail(&a).unwrap(),
            prober.headtail(&b).unwrap()
        );
    }

    #[test]
    fn test_headtail_differs_for_different_ends() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.bin", b"aaaaaaaaaa-mid-aaaaaaaaaa");
        let b = write_file(dir.path(), "b.bin", b"bbbbbbbbbb-mid-bbbbbbbbbb");

        let prober = Prober::with_defaults();
        assert_ne!(
            prober.headtail(&a).unwrap(),
            prober.headtail(&b).unwrap()
        );
    }

    #[test]
    fn test_headtail_short_file_overlapping_windows() {
        let dir = TempDir::new().unwrap();
        // 4 bytes < 2 * 10: head and tail windows overlap entirely.
        let a = write_file(dir.path(), "short.bin", b"abcd");
        let b = write_file(dir.path(), "short2.bin", b"abcd");

        let prober = Prober::with_defaults();
        let da = prober.headtail(&a).unwrap();
        let db = prober.headtail(&b).unwrap();
        assert_eq!(da, db);

        let c = write_file(dir.path(), "short3.bin", b"abce");
        assert_ne!(da, prober.headtail(&c).unwrap());
    }

    #[test]
    fn test_headtail_configurable_window() {
        let dir = TempDir::new().unwrap();
        // Identical first/last 2 bytes, different within the 10-byte window.
        let a = write_file(dir.path(), "a.bin", b"xxAAAAAAAAAAxx");
        let b = write_file(dir.path(), "b.bin", b"xxBBBBBBBBBBxx");

        let narrow = Prober::new(ProberConfig::default().with_headtail_bytes(2));
        assert_eq!(narrow.headtail(&a).unwrap(), narrow.headtail(&b).unwrap());

        let wide = Prober::with_defaults();
        assert_ne!(wide.headtail(&a).unwrap(), wide.headtail(&b).unwrap());
    }

    #[test]
    fn test_checksum_matches_blake3() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "data.bin", b"some file content");

        let prober = Prober::with_defaults();
        let digest = prober.checksum(&path).unwrap();
        assert_eq!(digest, *blake3::hash(b"some file content").as_bytes());
    }

    #[test]
    fn test_probe_missing_file_is_not_found() {
        let prober = Prober::with_defaults();
        let missing = Path::new("/nonexistent/file.bin");
        assert!(matches!(
            prober.headtail(missing),
            Err(ProbeError::NotFound(_))
        ));
        assert!(matches!(
            prober.checksum(missing),
            Err(ProbeError::NotFound(_))
        ));
    }

    #[test]
    fn test_batch_preserves_ordinal_order_and_records_failures() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.bin", b"content-a");
        let b = write_file(dir.path(), "b.bin", b"content-b");

        let mut records = vec![record(0, &a), record(1, &b)];
        // A record whose file vanished between indexing and probing.
        records.push(FileRecord::new(
            2,
            dir.path().join("vanished.bin"),
            9,
            SystemTime::now(),
            None,
        ));

        let prober = Prober::with_defaults();
        let batch = prober.checksum_batch(records);

        assert_eq!(batch.probed.len(), 2);
        assert_eq!(batch.failures.len(), 1);
        let ords: Vec<usize> = batch.probed.iter().map(|r| r.ord).collect();
        assert_eq!(ords, vec![0, 1]);
        assert!(batch.probed.iter().all(|r| r.checksum.is_some()));
    }

    #[test]
    fn test_batch_shutdown_flag_short_circuits() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.bin", b"content-a");

        let flag = Arc::new(AtomicBool::new(true));
        let prober = Prober::new(ProberConfig::default().with_shutdown_flag(flag));
        let batch = prober.checksum_batch(vec![record(0, &a)]);

        assert!(batch.interrupted);
        assert!(batch.probed.is_empty());
    }
}
