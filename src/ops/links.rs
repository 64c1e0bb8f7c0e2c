//! Soft-link farm creation.
//!
//! Builds `<target>/LINKS_TO_DUPLICATES` containing one symbolic link per
//! duplicate, named `<zero-padded-seq> <original base name>`, pointing at
//! the original path. Originals are never altered, so this operation needs
//! no confirmation.

use std::fs;
use std::path::Path;

use crate::scanner::FileRecord;

use super::{OpOutcome, LINKS_DIR};

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

/// Create the link farm for the full duplicate set.
///
/// # Errors
///
/// Fails only when the link directory itself cannot be created; per-file
/// failures are recorded in the outcome.
pub fn link_duplicates(
    target_root: &Path,
    records: &[FileRecord],
) -> std::io::Result<OpOutcome> {
    let link_dir = target_root.join(LINKS_DIR);
    fs::create_dir_all(&link_dir)?;
    log::info!("Creating {} links under {}", records.len(), link_dir.display());

    let mut outcome = OpOutcome::default();
    for (i, record) in records.iter().enumerate() {
        let base_name = record
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let link_path = link_dir.join(format!("{:04} {base_name}", i + 1));

        match symlink(&record.path, &link_path) {
            Ok(()) => {
                log::debug!(
                    "Linked {} -> {}",
                    link_path.display(),
                    record.path.display()
                );
                outcome.completed.push(record.clone());
            }
            Err(e) => outcome.record_failure(link_path, e),
        }
    }
    Ok(outcome)
}
