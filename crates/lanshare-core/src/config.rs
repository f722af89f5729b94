//! Configuration for a shared directory.

use crate::Result;
use crate::ShareError;
use std::path::PathBuf;

/// How a `Delete` batch reacts to a selected entry that no longer exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Record the entry as missing and keep going with the rest of the batch.
    #[default]
    ContinueOnMissing,

    /// Stop the batch at the first missing entry. Remaining entries are left
    /// untouched and reported as skipped.
    StopOnMissing,
}

/// How a `Download` archive reaches the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Build the archive in the staging directory first, then stream the file
    /// with an exact `Content-Length`.
    #[default]
    Staged,

    /// Pipe the compressor output straight into the response body.
    /// Nothing touches the disk and the response is chunked.
    Streamed,
}

/// Configuration for a shared directory.
///
/// # Examples
///
/// ```
/// use lanshare_core::ShareConfig;
/// use lanshare_core::config::DeletePolicy;
///
/// let config = ShareConfig::new("/srv/share")
///     .with_delete_policy(DeletePolicy::StopOnMissing)
///     .with_compression_level(9);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ShareConfig {
    /// Directory exposed at `/`.
    ///
    /// Default: `.`.
    pub root: PathBuf,

    /// Behaviour of `Delete` when a selected entry is missing.
    ///
    /// Default: [`DeletePolicy::ContinueOnMissing`].
    pub delete_policy: DeletePolicy,

    /// Archive delivery mode.
    ///
    /// Default: [`ArchiveMode::Staged`].
    pub archive_mode: ArchiveMode,

    /// Keep staged archives on disk after they have been sent.
    ///
    /// Default: `false` (removed once the response body is dropped).
    pub keep_archives: bool,

    /// Directory where staged archives are written.
    ///
    /// `None` means the system temporary directory.
    ///
    /// Default: `None`.
    pub staging_dir: Option<PathBuf>,

    /// xz preset (0-9).
    ///
    /// Default: `6`.
    pub compression_level: u8,

    /// Text shown in the footer of every listing page.
    pub signature: String,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            delete_policy: DeletePolicy::default(),
            archive_mode: ArchiveMode::default(),
            keep_archives: false,
            staging_dir: None,
            compression_level: 6,
            signature: format!("lanshare {}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ShareConfig {
    /// Creates a configuration sharing `root` with default settings.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the delete policy.
    #[must_use]
    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Sets the archive delivery mode.
    #[must_use]
    pub fn with_archive_mode(mut self, mode: ArchiveMode) -> Self {
        self.archive_mode = mode;
        self
    }

    /// Sets whether staged archives are kept after sending.
    #[must_use]
    pub fn with_keep_archives(mut self, keep: bool) -> Self {
        self.keep_archives = keep;
        self
    }

    /// Sets the staging directory.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    /// Sets the compression level.
    ///
    /// Values above 9 are rejected by [`validate`](Self::validate).
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the listing footer text.
    #[must_use]
    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = signature.into();
        self
    }

    /// Returns the directory staged archives are written to.
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::InvalidConfig` if the compression level is out of
    /// range, or `ShareError::NotFound` if the root or the staging directory
    /// is not a directory.
    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(ShareError::InvalidConfig(format!(
                "compression level must be 0-9, got {}",
                self.compression_level
            )));
        }

        if !self.root.is_dir() {
            return Err(ShareError::NotFound {
                path: self.root.clone(),
            });
        }

        if let Some(dir) = &self.staging_dir
            && !dir.is_dir()
        {
            return Err(ShareError::NotFound { path: dir.clone() });
        }

        Ok(())
    }
}
