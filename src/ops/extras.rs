//! Hard-linking and removal of extras.
//!
//! Both operations act only on the extras of each duplicate group; the
//! master is never touched. They are gated upstream on the checksum
//! criterion being part of the effective match set, so they can never act
//! on probabilistic-only matches.

use std::fs;
use std::path::{Path, PathBuf};

use crate::duplicates::DuplicateGroup;

use super::OpOutcome;

/// Suffix for the temporary link created next to each extra.
const TMP_SUFFIX: &str = ".dupsweep-tmp";

/// Replace every extra with a hard link to its group's master.
///
/// The link is created under a temporary name and renamed over the extra,
/// so the extra is replaced atomically and the master's own inode is never
/// altered.
#[must_use]
pub fn hardlink_extras(groups: &[DuplicateGroup]) -> OpOutcome {
    let mut outcome = OpOutcome::default();
    for group in groups {
        let master = group.master();
        for extra in group.extras() {
            match link_over(&master.path, &extra.path) {
                Ok(()) => {
                    log::debug!(
                        "Hard-linked {} -> {}",
                        extra.path.display(),
                        master.path.display()
                    );
                    outcome.bytes += extra.size;
                    outcome.completed.push(extra.clone());
                }
                Err(e) => outcome.record_failure(extra.path.clone(), e),
            }
        }
    }
    log::info!("{}", outcome.summary("Hard-linked"));
    outcome
}

/// Delete every extra, leaving each group's master untouched.
#[must_use]
pub fn remove_extras(groups: &[DuplicateGroup]) -> OpOutcome {
    let mut outcome = OpOutcome::default();
    for group in groups {
        for extra in group.extras() {
            match fs::remove_file(&extra.path) {
                Ok(()) => {
                    log::debug!("Removed {}", extra.path.display());
                    outcome.bytes += extra.size;
                    outcome.completed.push(extra.clone());
                }
                Err(e) => outcome.record_failure(extra.path.clone(), e),
            }
        }
    }
    log::info!("{}", outcome.summary("Removed"));
    outcome
}

fn link_over(master: &Path, extra: &Path) -> std::io::Result<()> {
    let tmp = tmp_name(extra);
    fs::hard_link(master, &tmp)?;
    if let Err(e) = fs::rename(&tmp, extra) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn tmp_name(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(TMP_SUFFIX);
    path.with_file_name(name)
}
