//! Importing reference uniques into the target tree.
//!
//! Copies every reference-tree file the diff found no counterpart for,
//! preserving the reference tree's relative directory structure under the
//! target root. An existing file at the destination is never overwritten;
//! the incoming copy gets a timestamp suffix instead.

use std::fs;
use std::path::{Path, PathBuf};

use crate::scanner::FileRecord;

use super::OpOutcome;

/// Copy the reference uniques under the target root.
#[must_use]
pub fn copy_uniques(
    target_root: &Path,
    reference_root: &Path,
    uniques: &[FileRecord],
) -> OpOutcome {
    log::info!(
        "Copying {} unique files from {} into {}",
        uniques.len(),
        reference_root.display(),
        target_root.display()
    );

    let mut outcome = OpOutcome::default();
    for record in uniques {
        let relative = match record.path.strip_prefix(reference_root) {
            Ok(rel) => rel,
            Err(_) => {
                outcome.record_failure(
                    record.path.clone(),
                    "not under the reference root".to_string(),
                );
                continue;
            }
        };
        let mut destination = target_root.join(relative);

        if let Some(parent) = destination.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                outcome.record_failure(record.path.clone(), e);
                continue;
            }
        }

        if destination.exists() {
            destination = suffixed_destination(&destination);
            log::debug!(
                "Destination exists, using {} instead",
                destination.display()
            );
            if destination.exists() {
                outcome.record_failure(
                    record.path.clone(),
                    format!("collision fallback also exists: {}", destination.display()),
                );
                continue;
            }
        }

        match fs::copy(&record.path, &destination) {
            Ok(copied) => {
                log::debug!(
                    "Copied {} -> {}",
                    record.path.display(),
                    destination.display()
                );
                outcome.bytes += copied;
                let mut imported = record.clone();
                imported.path = destination;
                outcome.completed.push(imported);
            }
            Err(e) => outcome.record_failure(record.path.clone(), e),
        }
    }
    log::info!("{}", outcome.summary("Copied"));
    outcome
}

/// Insert a timestamp before the extension so the extension survives.
fn suffixed_destination(destination: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffixed = match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}.{stamp}{}", &name[..idx], &name[idx..]),
        _ => format!("{name}.{stamp}"),
    };
    destination.with_file_name(suffixed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::FileId;
    use std::fs::File;
    use std::io::Write;
    use std::time::SystemTime;
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
            meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            FileId::from_metadata(&meta),
        )
    }

    #[test]
    fn test_copy_preserves_relative_structure() {
        let target = TempDir::new().unwrap();
        let reference = TempDir::new().unwrap();
        let unique = write_file(reference.path(), "albums/2020/song.mp3", b"audio");

        let outcome = copy_uniques(target.path(), reference.path(), &[record_for(0, &unique)]);

        assert!(outcome.all_succeeded());
        let copied = target.path().join("albums/2020/song.mp3");
        assert_eq!(fs::read(&copied).unwrap(), b"audio");
        // The source is untouched.
        assert!(unique.exists());
        assert_eq!(outcome.completed[0].path, copied);
    }

    #[test]
    fn test_copy_collision_appends_timestamp_suffix() {
        let target = TempDir::new().unwrap();
        let reference = TempDir::new().unwrap();
        write_file(target.path(), "notes.txt", b"existing");
        let unique = write_file(reference.path(), "notes.txt", b"incoming");

        let outcome = copy_uniques(target.path(), reference.path(), &[record_for(0, &unique)]);

        assert!(outcome.all_succeeded());
        // The original is not overwritten.
        assert_eq!(fs::read(target.path().join("notes.txt")).unwrap(), b"existing");
        let imported = &outcome.completed[0].path;
        let name = imported.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("notes."));
        assert!(name.ends_with(".txt"));
        assert_ne!(name.as_ref(), "notes.txt");
        assert_eq!(fs::read(imported).unwrap(), b"incoming");
    }

    #[test]
    fn test_copy_failure_is_recorded_and_continues() {
        let target = TempDir::new().unwrap();
        let reference = TempDir::new().unwrap();
        let ghost_path = write_file(reference.path(), "ghost.bin", b"gone");
        let ghost = record_for(0, &ghost_path);
        fs::remove_file(&ghost_path).unwrap();
        let alive = write_file(reference.path(), "alive.bin", b"here");

        let outcome = copy_uniques(
            target.path(),
            reference.path(),
            &[ghost, record_for(1, &alive)],
        );

        assert_eq!(outcome.failure_count(), 1);
        assert_eq!(outcome.success_count(), 1);
        assert!(target.path().join("alive.bin").exists());
    }

    #[test]
    fn test_suffix_keeps_extension() {
        let path = Path::new("/t/report.pdf");
        let suffixed = suffixed_destination(path);
        let name = suffixed.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("report."));
        assert!(name.ends_with(".pdf"));
    }
}
