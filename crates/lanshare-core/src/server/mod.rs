//! HTTP front end.
//!
//! [`router`] builds the complete `axum` application for a share: every GET
//! goes through [`StaticFiles`], which serves regular files itself and hands
//! directories to a [`ShareHandler`].

pub mod body;
pub mod handler;
pub mod static_files;

pub use handler::ShareHandler;
pub use static_files::DirectoryRequest;
pub use static_files::DirectoryResponder;
pub use static_files::StaticFiles;

use crate::Result;
use crate::ShareConfig;
use crate::ShareError;
use axum::Router;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use log::debug;
use log::info;
use log::warn;
use std::sync::Arc;
use std::time::Instant;

/// Builds the application serving `config.root`.
///
/// # Examples
///
/// ```no_run
/// use lanshare_core::ShareConfig;
/// use lanshare_core::server::router;
///
/// # async fn run() -> std::io::Result<()> {
/// let app = router(ShareConfig::new("/srv/share"));
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await
/// # }
/// ```
pub fn router(config: ShareConfig) -> Router {
    let root = config.root.clone();
    let handler: Arc<dyn DirectoryResponder> = Arc::new(ShareHandler::new(config));
    let files = Arc::new(StaticFiles::new(root, handler));

    Router::new()
        .route("/", get(serve_path))
        .route("/{*path}", get(serve_path))
        .with_state(files)
        .layer(middleware::from_fn(log_request))
}

async fn serve_path(State(files): State<Arc<StaticFiles>>, request: Request) -> Response {
    files.serve(request).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;
    info!(
        "{method} {uri} {} ({:?})",
        response.status().as_u16(),
        start.elapsed()
    );
    response
}

/// Runs blocking filesystem work off the async executor.
pub(crate) async fn run_blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ShareError::Task(e.to_string()))?
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let status = if self.is_not_found() {
            match self.path() {
                Some(path) => debug!("not found: {}", path.display()),
                None => debug!("{self}"),
            }
            StatusCode::NOT_FOUND
        } else {
            warn!("request failed: {self}");
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}
