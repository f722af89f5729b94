//! The directory handler: actions first, then the listing.

use crate::Result;
use crate::ShareConfig;
use crate::actions::BulkExecutor;
use crate::actions::Outcome;
use crate::actions::archive;
use crate::config::ArchiveMode;
use crate::listing;
use crate::query::Action;
use crate::query::ActionRequest;
use crate::query::Selection;
use crate::query::parse_query;
use crate::server::body;
use crate::server::run_blocking;
use crate::server::static_files::DirectoryRequest;
use crate::server::static_files::DirectoryResponder;
use async_trait::async_trait;
use axum::body::Body;
use axum::response::IntoResponse;
use axum::response::Response;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

/// Answers directory requests: runs a submitted action, then renders the
/// listing.
///
/// A `Download` replaces the listing with the archive. A `Delete` is
/// followed by the listing so the page shows what is left.
#[derive(Debug, Clone)]
pub struct ShareHandler {
    config: Arc<ShareConfig>,
}

impl ShareHandler {
    /// Creates a handler for `config`.
    #[must_use]
    pub fn new(config: ShareConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Handler configuration.
    #[must_use]
    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    /// Handles one directory request.
    ///
    /// # Errors
    ///
    /// Returns `ShareError::NotFound` if the directory cannot be listed and
    /// `ShareError::SourceNotFound` if a download selection is stale.
    pub async fn handle(&self, request: DirectoryRequest) -> Result<Response> {
        if let Some(action) = parse_query(request.query.as_deref()) {
            debug!(
                "{} requested for {} entries in {}",
                action.action,
                action.selection.len(),
                request.dir.display()
            );

            if action.action == Action::Download
                && self.config.archive_mode == ArchiveMode::Streamed
            {
                return self.stream_archive(action.selection, request.dir).await;
            }

            match self.execute(action, request.dir.clone()).await? {
                Outcome::Archive(staged) => return body::staged_response(staged).await,
                Outcome::Deleted(_) => {}
            }
        }

        self.listing(request).await
    }

    async fn execute(&self, action: ActionRequest, dir: PathBuf) -> Result<Outcome> {
        let config = Arc::clone(&self.config);
        run_blocking(move || BulkExecutor::new(&config).execute(&action, &dir)).await
    }

    async fn listing(&self, request: DirectoryRequest) -> Result<Response> {
        let signature = self.config.signature.clone();
        let page = run_blocking(move || {
            listing::render_listing(&request.dir, &request.request_path, &signature)
        })
        .await?;
        Ok(body::listing_response(page))
    }

    /// Pipes the archive into the response as it is compressed.
    ///
    /// Missing entries are caught before the response starts. A failure
    /// after that point aborts the body.
    async fn stream_archive(&self, selection: Selection, dir: PathBuf) -> Result<Response> {
        let sources = run_blocking(move || archive::resolve_sources(&selection, &dir)).await?;
        let file_name = format!("{}{}", archive::timestamp(), archive::ARCHIVE_SUFFIX);

        let stream = body::stream_archive(sources, self.config.compression_level, file_name.clone());
        body::attachment_response(&file_name, Body::from_stream(stream))
    }
}

#[async_trait]
impl DirectoryResponder for ShareHandler {
    async fn respond(&self, request: DirectoryRequest) -> Response {
        self.handle(request)
            .await
            .unwrap_or_else(IntoResponse::into_response)
    }
}
