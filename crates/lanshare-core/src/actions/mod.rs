//! Bulk actions over a selection.
//!
//! [`BulkExecutor`] runs the blocking part of an action: building a staged
//! archive for `Download`, or removing entries for `Delete`. Streamed
//! downloads are driven by the HTTP layer directly through
//! [`archive::write_archive`].

pub mod archive;
pub mod delete;

pub use archive::ArchiveReport;
pub use archive::StagedArchive;
pub use delete::DeleteReport;

use crate::Result;
use crate::ShareConfig;
use crate::ShareError;
use crate::query::Action;
use crate::query::ActionRequest;
use log::info;
use std::ffi::OsStr;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Result of a bulk action.
#[derive(Debug)]
pub enum Outcome {
    /// A finished archive, ready to be sent.
    Archive(StagedArchive),
    /// The outcome of a delete batch.
    Deleted(DeleteReport),
}

/// Executes bulk actions for one shared directory tree.
#[derive(Debug, Clone, Copy)]
pub struct BulkExecutor<'a> {
    config: &'a ShareConfig,
}

impl<'a> BulkExecutor<'a> {
    /// Creates an executor using `config`.
    #[must_use]
    pub const fn new(config: &'a ShareConfig) -> Self {
        Self { config }
    }

    /// Runs `request` against the entries of `base_dir`.
    ///
    /// # Errors
    ///
    /// A `Download` fails if a selected entry is missing or the archive
    /// cannot be written. A `Delete` never fails; per-entry problems are in
    /// the returned report.
    pub fn execute(&self, request: &ActionRequest, base_dir: &Path) -> Result<Outcome> {
        match request.action {
            Action::Download => {
                let staged = archive::stage_archive(&request.selection, base_dir, self.config)?;
                let report = staged.report();
                info!(
                    "archived {} entries from {} into {} ({} bytes in {:?})",
                    report.entries(),
                    base_dir.display(),
                    staged.file_name(),
                    report.bytes_compressed,
                    report.duration
                );
                Ok(Outcome::Archive(staged))
            }
            Action::Delete => {
                let report =
                    delete::delete_selection(&request.selection, base_dir, self.config.delete_policy);
                info!(
                    "deleted {} of {} entries in {} ({} missing, {} failed, {} skipped)",
                    report.removed.len(),
                    request.selection.len(),
                    base_dir.display(),
                    report.missing.len(),
                    report.failed.len(),
                    report.skipped.len()
                );
                Ok(Outcome::Deleted(report))
            }
        }
    }
}

/// Resolves a selected name below `base_dir`.
///
/// Returns the path on disk and the name relative to `base_dir`. Root and
/// prefix components are dropped, so `/etc/x` names `<base_dir>/etc/x`
/// rather than `/etc/x`.
///
/// # Errors
///
/// Returns `ShareError::InvalidPath` if the name contains `..` or names
/// `base_dir` itself.
///
/// # Examples
///
/// ```
/// use lanshare_core::actions::resolve_entry;
/// use std::ffi::OsStr;
/// use std::path::Path;
///
/// let (path, name) = resolve_entry(Path::new("/srv/share"), OsStr::new("/etc/x")).unwrap();
/// assert_eq!(path, Path::new("/srv/share/etc/x"));
/// assert_eq!(name, Path::new("etc/x"));
///
/// assert!(resolve_entry(Path::new("/srv/share"), OsStr::new("../x")).is_err());
/// ```
pub fn resolve_entry(base_dir: &Path, name: &OsStr) -> Result<(PathBuf, PathBuf)> {
    let invalid = || ShareError::InvalidPath {
        path: PathBuf::from(name),
    };

    let mut relative = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => return Err(invalid()),
        }
    }

    if relative.as_os_str().is_empty() {
        return Err(invalid());
    }
    Ok((base_dir.join(&relative), relative))
}
