//! Scanner module for directory traversal and content probing.
//!
//! This module provides functionality for:
//! - Depth-bounded parallel directory walking using jwalk
//! - Head/tail byte sampling and full-content checksums with BLAKE3
//! - Hard-link identity via (device, inode) keys
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file record creation
//! - [`prober`]: Lazy content probes (head/tail digest, full checksum)
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Indexer, IndexerConfig};
//! use std::path::Path;
//!
//! let indexer = Indexer::new(Path::new("."), IndexerConfig::default());
//! let outcome = indexer.index().unwrap();
//! for record in &outcome.records {
//!     println!("{}: {} bytes", record.path.display(), record.size);
//! }
//! ```

pub mod prober;
pub mod walker;

use std::fs::Metadata;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::SystemTime;

use unicode_normalization::UnicodeNormalization;

pub use prober::{Prober, ProberConfig};
pub use walker::{IndexOutcome, Indexer};

/// BLAKE3 digest of probed content (head/tail sample or full file).
pub type Digest = [u8; 32];

/// Render a digest as lowercase hex.
#[must_use]
pub fn digest_hex(digest: &Digest) -> String {
    blake3::Hash::from_bytes(*digest).to_hex().to_string()
}

/// File extension derived from the base name.
///
/// A file whose base name has no `.` has no extension at all, which must be
/// distinguishable from a name that ends in a bare `.` (empty extension).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extension {
    /// No `.` in the base name.
    None,
    /// Everything after the last `.`, lowercased and NFC-normalized.
    Ext(String),
}

impl Extension {
    /// Sentinel shown in reports for files without an extension.
    pub const NONE_SENTINEL: &'static str = "none";
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "{}", Self::NONE_SENTINEL),
            Self::Ext(ext) => write!(f, "{ext}"),
        }
    }
}

/// Platform identity of a file's on-disk data.
///
/// Two records with the same `FileId` are hard links to the same data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    /// Device the file lives on.
    pub dev: u64,
    /// Inode number on that device.
    pub ino: u64,
}

impl FileId {
    /// Extract the identity from file metadata.
    ///
    /// Returns `None` on platforms without inode support; such records are
    /// never considered hard links of each other.
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Some(Self {
                dev: metadata.dev(),
                ino: metadata.ino(),
            })
        }
        #[cfg(not(unix))]
        {
            let _ = metadata;
            None
        }
    }
}

/// Split a base name at the last `.` into (name, extension).
///
/// `"archive.tar.gz"` → `("archive.tar", Ext("gz"))`, `"Makefile"` →
/// `("Makefile", None)`, `"dump."` → `("dump", Ext(""))`. Both halves are
/// NFC-normalized; the extension is additionally lowercased so `JPG` and
/// `jpg` compare equal.
#[must_use]
pub fn split_name(base_name: &str) -> (String, Extension) {
    match base_name.rfind('.') {
        Some(idx) => {
            let name = base_name[..idx].nfc().collect::<String>();
            let ext = base_name[idx + 1..].to_lowercase().nfc().collect::<String>();
            (name, Extension::Ext(ext))
        }
        None => (base_name.nfc().collect::<String>(), Extension::None),
    }
}

/// One record per regular, non-empty file discovered by the indexer.
///
/// Immutable after creation except for the two lazily filled probe digests,
/// and `path`, which is rewritten when a move operation relocates the file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Stable input ordinal in indexer emission order. Master selection and
    /// report ordering key off this, never off parallel completion order.
    pub ord: usize,
    /// Absolute path to the file.
    pub path: PathBuf,
    /// File size in bytes, always > 0.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Hard-link identity, if the platform exposes one.
    pub file_id: Option<FileId>,
    /// Base name before the last `.`, NFC-normalized.
    pub name: String,
    /// Extension after the last `.`, or the no-extension sentinel.
    pub extension: Extension,
    /// Digest of the first and last N bytes; present after a head/tail probe.
    pub headtail: Option<Digest>,
    /// Full-content digest; present after a checksum probe.
    pub checksum: Option<Digest>,
}

impl FileRecord {
    /// Create a record from walked metadata.
    #[must_use]
    pub fn new(
        ord: usize,
        path: PathBuf,
        size: u64,
        modified: SystemTime,
        file_id: Option<FileId>,
    ) -> Self {
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (name, extension) = split_name(&base_name);
        Self {
            ord,
            path,
            size,
            modified,
            file_id,
            name,
            extension,
            headtail: None,
            checksum: None,
        }
    }
}

/// Configuration for the indexer.
#[derive(Debug, Clone, Default)]
pub struct IndexerConfig {
    /// Maximum traversal depth below the root (>= 1). `None` is unbounded.
    pub max_depth: Option<usize>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl IndexerConfig {
    /// Bound the traversal depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The root path does not exist or is not a directory.
    #[error("Invalid directory: {0}")]
    InvalidDirectory(PathBuf),

    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while probing a file's content.
///
/// A probe failure is a valid outcome under concurrent filesystem mutation;
/// the record is dropped from the candidate set and the failure recorded.
#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    /// The file vanished between indexing and probing.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    pub(crate) fn from_io(path: &std::path::Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the probe failed on.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::PermissionDenied(p) | Self::Io { path: p, .. } => p,
        }
    }
}
