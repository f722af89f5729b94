//! Batch removal of a selection.

use crate::actions::resolve_entry;
use crate::config::DeletePolicy;
use crate::query::Selection;
use log::debug;
use log::warn;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

/// A selected entry that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    /// Entry name as selected.
    pub name: OsString,
    /// Error message.
    pub reason: String,
}

/// Per-entry outcome of a delete batch.
///
/// # Examples
///
/// ```
/// use lanshare_core::actions::delete::DeleteReport;
///
/// let report = DeleteReport::default();
/// assert!(report.is_complete());
/// assert_eq!(report.processed(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Entries removed from disk.
    pub removed: Vec<OsString>,

    /// Entries that no longer existed.
    pub missing: Vec<OsString>,

    /// Entries whose removal failed for another reason.
    pub failed: Vec<DeleteFailure>,

    /// Entries never attempted because the batch stopped early.
    pub skipped: Vec<OsString>,
}

impl DeleteReport {
    /// Returns `true` if every selected entry was attempted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Number of entries attempted.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.removed.len() + self.missing.len() + self.failed.len()
    }
}

/// Removes every selected entry under `base_dir`, in selection order.
///
/// Names are resolved with [`resolve_entry`], so absolute names stay below
/// `base_dir` and names containing `..` are recorded as failures. Files and
/// symlinks are unlinked (links are never followed); anything else is
/// removed as a directory tree. A missing entry either is recorded
/// and skipped, or ends the batch, depending on `policy`. Other failures are
/// recorded and the batch continues. Removals already done are never undone.
pub fn delete_selection(selection: &Selection, base_dir: &Path, policy: DeletePolicy) -> DeleteReport {
    let mut report = DeleteReport::default();
    let mut names = selection.iter();

    while let Some(name) = names.next() {
        let path = match resolve_entry(base_dir, name) {
            Ok((path, _)) => path,
            Err(err) => {
                warn!("refusing to remove {}: {err}", name.display());
                report.failed.push(DeleteFailure {
                    name: name.to_os_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        match remove_entry(&path) {
            Ok(()) => {
                debug!("removed {}", path.display());
                report.removed.push(name.to_os_string());
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("already gone: {}", path.display());
                report.missing.push(name.to_os_string());
                if policy == DeletePolicy::StopOnMissing {
                    report.skipped.extend(names.map(std::ffi::OsStr::to_os_string));
                    break;
                }
            }
            Err(err) => {
                warn!("cannot remove {}: {err}", path.display());
                report.failed.push(DeleteFailure {
                    name: name.to_os_string(),
                    reason: err.to_string(),
                });
            }
        }
    }

    report
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(path)?;
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
