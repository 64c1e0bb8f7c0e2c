//! Relocation of duplicates and its designed inverse.
//!
//! # Overview
//!
//! `move_duplicates` relocates every duplicate into `<target>/DUPLICATES`
//! under its encoded name (see [`super::codec`]); `move_back` decodes every
//! file found there and restores it to its original path, recreating any
//! intermediate directories. The pair is a round trip: move followed by
//! move-back on an unmodified relocation directory restores every file.
//!
//! Files whose path cannot be encoded (too long, delimiter present) are
//! skipped and recorded, never truncated; the batch always continues.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::scanner::{FileId, FileRecord};

use super::{OpOutcome, PathCodec, DUPLICATES_DIR};

/// Relocate the full duplicate set into the relocation directory.
///
/// Successful records come back with their path rewritten to the new
/// location, suitable for the moved-file report.
///
/// # Errors
///
/// Fails only when the relocation directory itself cannot be created;
/// per-file failures (encode refusal, rename errors) are recorded.
pub fn move_duplicates(
    target_root: &Path,
    records: Vec<FileRecord>,
) -> std::io::Result<OpOutcome> {
    let dup_dir = target_root.join(DUPLICATES_DIR);
    fs::create_dir_all(&dup_dir)?;
    let codec = PathCodec::new(target_root);
    log::info!(
        "Relocating {} files into {}",
        records.len(),
        dup_dir.display()
    );

    let mut outcome = OpOutcome::default();
    for (i, mut record) in records.into_iter().enumerate() {
        let encoded = match codec.encode(i + 1, &record.path) {
            Ok(token) => token,
            Err(e) => {
                // Skipped, not truncated: truncation would break decode.
                outcome.record_failure(record.path.clone(), format!("relocation skipped: {e}"));
                continue;
            }
        };
        let destination = dup_dir.join(&encoded);

        match fs::rename(&record.path, &destination) {
            Ok(()) => {
                log::debug!(
                    "Moved {} -> {}",
                    record.path.display(),
                    destination.display()
                );
                outcome.bytes += record.size;
                record.path = destination;
                outcome.completed.push(record);
            }
            Err(e) => outcome.record_failure(record.path.clone(), e),
        }
    }
    Ok(outcome)
}

/// Restore every file found in the relocation directory.
///
/// Only meaningful when applied to an unmodified `DUPLICATES` directory;
/// names that do not decode and destinations that already exist are
/// recorded as failures and left in place. The relocation directory is
/// removed once emptied.
///
/// # Errors
///
/// Fails when the relocation directory does not exist.
pub fn move_back(target_root: &Path) -> std::io::Result<OpOutcome> {
    let dup_dir = target_root.join(DUPLICATES_DIR);
    if !dup_dir.is_dir() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no relocation directory at {}", dup_dir.display()),
        ));
    }
    let codec = PathCodec::new(target_root);

    let mut outcome = OpOutcome::default();
    // The relocation directory is flat; one level is all there is.
    for entry in WalkDir::new(&dup_dir).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map_or_else(|| dup_dir.clone(), Path::to_path_buf);
                outcome.record_failure(path, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let original = match codec.decode(&name) {
            Ok(path) => path,
            Err(e) => {
                outcome.record_failure(entry.path().to_path_buf(), e);
                continue;
            }
        };

        if original.exists() {
            outcome.record_failure(
                entry.path().to_path_buf(),
                format!("destination already exists: {}", original.display()),
            );
            continue;
        }
        if let Some(parent) = original.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                outcome.record_failure(entry.path().to_path_buf(), e);
                continue;
            }
        }

        match fs::rename(entry.path(), &original) {
            Ok(()) => {
                log::debug!("Restored {} -> {}", name, original.display());
                match restored_record(outcome.completed.len(), &original) {
                    Some(record) => {
                        outcome.bytes += record.size;
                        outcome.completed.push(record);
                    }
                    None => log::warn!(
                        "Restored {} but could not stat it afterwards",
                        original.display()
                    ),
                }
            }
            Err(e) => outcome.record_failure(entry.path().to_path_buf(), e),
        }
    }

    // Leave the directory in place if anything could not be restored.
    if outcome.all_succeeded() {
        if let Err(e) = fs::remove_dir(&dup_dir) {
            log::debug!("Relocation directory not removed: {e}");
        }
    }
    Ok(outcome)
}

fn restored_record(ord: usize, path: &Path) -> Option<FileRecord> {
    let metadata = fs::metadata(path).ok()?;
    Some(FileRecord::new(
        ord,
        path.to_path_buf(),
        metadata.len(),
        metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        FileId::from_metadata(&metadata),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        File::create(&path).unwrap().write_all(content).unwrap();
        path
    }

    fn record_for(ord: usize, path: &Path) -> FileRecord {
        let meta = fs::metadata(path).unwrap();
        FileRecord::new(
            ord,
            path.to_path_buf(),
            meta.len(),
            meta.modified().unwrap(),
            FileId::from_metadata(&meta),
        )
    }

    #[test]
    fn test_move_relocates_under_encoded_names() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "docs/a.txt", b"dup");
        let b = write_file(dir.path(), "b.txt", b"dup");

        let outcome =
            move_duplicates(dir.path(), vec![record_for(0, &a), record_for(1, &b)]).unwrap();

        assert!(outcome.all_succeeded());
        assert!(!a.exists());
        assert!(!b.exists());

        let dup_dir = dir.path().join(DUPLICATES_DIR);
        assert!(dup_dir.join("0001 ::docs\u{00A6}a.txt").exists());
        assert!(dup_dir.join("0002 ::b.txt").exists());

        // Completed records point at the new locations.
        assert!(outcome.completed[0].path.starts_with(&dup_dir));
    }

    #[test]
    fn test_move_then_move_back_round_trip() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "deep/nested/tree/a.txt", b"content-a");
        let b = write_file(dir.path(), "b.txt", b"content-b");

        move_duplicates(dir.path(), vec![record_for(0, &a), record_for(1, &b)]).unwrap();
        assert!(!a.exists());
        // The intermediate directories may remain; the files are gone.

        let outcome = move_back(dir.path()).unwrap();
        assert!(outcome.all_succeeded());
        assert_eq!(outcome.success_count(), 2);

        assert_eq!(fs::read(&a).unwrap(), b"content-a");
        assert_eq!(fs::read(&b).unwrap(), b"content-b");
        assert!(!dir.path().join(DUPLICATES_DIR).exists());
    }

    #[test]
    fn test_move_back_recreates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "only/child/a.txt", b"payload");

        move_duplicates(dir.path(), vec![record_for(0, &a)]).unwrap();
        // Remove the now-empty original directories entirely.
        fs::remove_dir_all(dir.path().join("only")).unwrap();

        let outcome = move_back(dir.path()).unwrap();
        assert!(outcome.all_succeeded());
        assert_eq!(fs::read(&a).unwrap(), b"payload");
    }

    #[test]
    fn test_move_back_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.txt", b"original");

        move_duplicates(dir.path(), vec![record_for(0, &a)]).unwrap();
        // A new file appeared at the original path in the meantime.
        write_file(dir.path(), "a.txt", b"newcomer");

        let outcome = move_back(dir.path()).unwrap();
        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(fs::read(&a).unwrap(), b"newcomer");
        // The relocated copy stays put for manual inspection.
        assert!(dir.path().join(DUPLICATES_DIR).join("0001 ::a.txt").exists());
    }

    #[test]
    fn test_move_skips_unencodable_path_and_continues() {
        let dir = TempDir::new().unwrap();
        let deep_rel: PathBuf = (0..30)
            .map(|i| format!("directory-level-{i:02}"))
            .collect();
        let too_long = write_file(
            dir.path(),
            &format!("{}/leaf.txt", deep_rel.display()),
            b"deep",
        );
        let fine = write_file(dir.path(), "fine.txt", b"ok");

        let outcome = move_duplicates(
            dir.path(),
            vec![record_for(0, &too_long), record_for(1, &fine)],
        )
        .unwrap();

        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.success_count(), 1);
        assert!(too_long.exists());
        assert!(!fine.exists());
        assert!(outcome.failures[0].1.contains("relocation skipped"));
    }

    #[test]
    fn test_move_back_without_relocation_dir_fails() {
        let dir = TempDir::new().unwrap();
        assert!(move_back(dir.path()).is_err());
    }

    #[test]
    fn test_move_back_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let a = write_file(dir.path(), "a.txt", b"dup");
        move_duplicates(dir.path(), vec![record_for(0, &a)]).unwrap();
        // Someone dropped an unrelated file into DUPLICATES.
        write_file(
            dir.path(),
            &format!("{DUPLICATES_DIR}/stray-note.txt"),
            b"not encoded",
        );

        let outcome = move_back(dir.path()).unwrap();
        assert_eq!(outcome.success_count(), 1);
        assert_eq!(outcome.failure_count(), 1);
        assert!(a.exists());
    }
}
