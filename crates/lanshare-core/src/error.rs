//! Error types for share operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ShareError`.
pub type Result<T> = std::result::Result<T, ShareError>;

/// Errors that can occur while serving a shared directory.
#[derive(Error, Debug)]
pub enum ShareError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory could not be listed, or the requested path does not exist.
    #[error("not found: {path}")]
    NotFound {
        /// The path that could not be listed.
        path: PathBuf,
    },

    /// An entry selected for download does not exist.
    #[error("selected entry not found: {path}")]
    SourceNotFound {
        /// The missing entry.
        path: PathBuf,
    },

    /// Request path leaves the shared root.
    #[error("path escapes the shared root: {path}")]
    InvalidPath {
        /// The offending request path.
        path: PathBuf,
    },

    /// Configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A blocking worker task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl ShareError {
    /// Returns `true` if this error should be reported to the client as a
    /// missing resource.
    ///
    /// # Examples
    ///
    /// ```
    /// use lanshare_core::ShareError;
    /// use std::path::PathBuf;
    ///
    /// let err = ShareError::NotFound {
    ///     path: PathBuf::from("/srv/share/gone"),
    /// };
    /// assert!(err.is_not_found());
    ///
    /// let err = ShareError::Task("worker panicked".to_string());
    /// assert!(!err.is_not_found());
    /// ```
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::SourceNotFound { .. } | Self::InvalidPath { .. }
        )
    }

    /// Returns the path the error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotFound { path } | Self::SourceNotFound { path } | Self::InvalidPath { path } => {
                Some(path)
            }
            _ => None,
        }
    }
}
