//! Static file serving with a pluggable directory responder.
//!
//! Regular files go to [`ServeDir`]. When a request resolves to a directory,
//! the request is handed to a [`DirectoryResponder`] instead.

use crate::Result;
use crate::ShareError;
use crate::encoding;
use async_trait::async_trait;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::Uri;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use log::debug;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// A GET request that resolved to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRequest {
    /// Directory on disk.
    pub dir: PathBuf,

    /// URL path as requested, always ending in `/`.
    pub request_path: String,

    /// Raw query string, if any.
    pub query: Option<String>,
}

/// Produces the response for a directory request.
#[async_trait]
pub trait DirectoryResponder: Send + Sync {
    /// Answers a request for a directory.
    async fn respond(&self, request: DirectoryRequest) -> Response;
}

/// Serves the files below a root directory.
pub struct StaticFiles {
    root: PathBuf,
    files: ServeDir,
    directories: Arc<dyn DirectoryResponder>,
}

impl StaticFiles {
    /// Serves `root`, handing directory requests to `directories`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, directories: Arc<dyn DirectoryResponder>) -> Self {
        let root = root.into();
        let files = ServeDir::new(&root).append_index_html_on_directories(false);
        Self {
            root,
            files,
            directories,
        }
    }

    /// Answers one request.
    ///
    /// Directories requested without a trailing slash are redirected to the
    /// slashed URL so that relative links on the listing page resolve.
    pub async fn serve(&self, request: Request) -> Response {
        let uri = request.uri().clone();
        let target = match resolve_path(&self.root, uri.path()) {
            Ok(target) => target,
            Err(err) => return err.into_response(),
        };

        let is_dir = tokio::fs::metadata(&target)
            .await
            .is_ok_and(|m| m.is_dir());
        if !is_dir {
            return match self.files.clone().oneshot(request).await {
                Ok(response) => response.into_response(),
                Err(never) => match never {},
            };
        }

        if !uri.path().ends_with('/') {
            return redirect_to_directory(&uri);
        }

        self.directories
            .respond(DirectoryRequest {
                dir: target,
                request_path: uri.path().to_string(),
                query: uri.query().map(str::to_owned),
            })
            .await
    }
}

/// Maps a URL path onto the filesystem below `root`.
///
/// # Errors
///
/// Returns `ShareError::InvalidPath` if a segment is `..` or decodes to
/// something that is not a single path component.
///
/// # Examples
///
/// ```
/// use lanshare_core::server::static_files::resolve_path;
/// use std::path::Path;
///
/// let path = resolve_path(Path::new("/srv"), "/photos/day%201/").unwrap();
/// assert_eq!(path, Path::new("/srv/photos/day 1"));
///
/// assert!(resolve_path(Path::new("/srv"), "/../etc/passwd").is_err());
/// ```
pub fn resolve_path(root: &Path, url_path: &str) -> Result<PathBuf> {
    let invalid = || ShareError::InvalidPath {
        path: PathBuf::from(url_path),
    };

    let mut path = root.to_path_buf();
    for segment in url_path.split('/') {
        let raw = encoding::decode_percent(segment.as_bytes());
        match raw.as_slice() {
            b"" | b"." => {}
            b".." => return Err(invalid()),
            bytes if bytes.iter().any(|&b| b == b'/' || b == b'\\' || b == 0) => {
                return Err(invalid());
            }
            _ => path.push(encoding::os_string_from_bytes(raw)),
        }
    }

    Ok(path)
}

fn redirect_to_directory(uri: &Uri) -> Response {
    let mut location = format!("{}/", uri.path());
    if let Some(query) = uri.query() {
        location.push('?');
        location.push_str(query);
    }
    debug!("redirecting {} to {location}", uri.path());

    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response(),
        Err(_) => StatusCode::BAD_REQUEST.into_response(),
    }
}
