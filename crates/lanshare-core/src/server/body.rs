//! Response construction for listings and archives.

use crate::Result;
use crate::ShareError;
use crate::actions::StagedArchive;
use crate::actions::archive;
use crate::actions::archive::ArchiveSource;
use crate::listing;
use crate::listing::ListingPage;
use axum::body::Body;
use axum::body::Bytes;
use axum::http::HeaderValue;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use futures::FutureExt;
use futures::Stream;
use log::debug;
use log::info;
use log::warn;
use std::io;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use std::task::ready;
use tempfile::TempPath;
use tokio::io::AsyncRead;
use tokio::io::DuplexStream;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;
use tokio_util::io::SyncIoBridge;

/// Buffer between the archive writer and the response body.
const PIPE_CAPACITY: usize = 64 * 1024;

/// `200 OK` with the listing page and its exact length.
pub fn listing_response(page: ListingPage) -> Response {
    let len = page.len();
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(listing::CONTENT_TYPE)),
            (header::CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        Body::from(page.into_bytes()),
    )
        .into_response()
}

/// `200 OK` streaming a staged archive with an exact `Content-Length`.
///
/// The archive is reopened from disk; a temporary archive is removed once
/// the body has been dropped.
///
/// # Errors
///
/// Returns an I/O error if the archive cannot be reopened.
pub async fn staged_response(staged: StagedArchive) -> Result<Response> {
    let (file_name, path, cleanup) = staged.into_parts();
    let file = tokio::fs::File::open(&path).await?;
    let size = file.metadata().await?.len();

    let stream = ArchiveStream::new(file, file_name.clone(), cleanup);
    let mut response = attachment_response(&file_name, Body::from_stream(stream))?;
    response
        .headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    Ok(response)
}

/// `200 OK` download response for `body`, without a length.
///
/// # Errors
///
/// Returns an error if `file_name` cannot be placed in a header.
pub fn attachment_response(file_name: &str, body: Body) -> Result<Response> {
    let disposition = HeaderValue::try_from(format!("attachment; filename=\"{file_name}\""))
        .map_err(|e| ShareError::Io(io::Error::other(e)))?;

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(archive::CONTENT_TYPE),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// Result of the task writing a streamed archive.
type WriteOutcome = std::result::Result<(), String>;

/// Archive bytes read from `R`.
///
/// Holds the cleanup guard of a staged archive so the file lives exactly as
/// long as the response body. Dropping the stream before the end means the
/// client went away; that is logged and otherwise ignored.
///
/// A streamed archive also carries the outcome of its writer. If the writer
/// failed, the stream ends with an error instead of a clean end of body, so
/// the connection is aborted and the client never sees a complete archive.
pub struct ArchiveStream<R> {
    inner: ReaderStream<R>,
    file_name: String,
    outcome: Option<oneshot::Receiver<WriteOutcome>>,
    finished: bool,
    failed: bool,
    _cleanup: Option<TempPath>,
}

impl<R: AsyncRead> ArchiveStream<R> {
    /// Streams `reader` as the archive `file_name`.
    pub fn new(reader: R, file_name: String, cleanup: Option<TempPath>) -> Self {
        Self {
            inner: ReaderStream::new(reader),
            file_name,
            outcome: None,
            finished: false,
            failed: false,
            _cleanup: cleanup,
        }
    }

    fn with_outcome(mut self, outcome: oneshot::Receiver<WriteOutcome>) -> Self {
        self.outcome = Some(outcome);
        self
    }
}

impl<R: AsyncRead + Unpin> Stream for ArchiveStream<R> {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(None) => {}
            poll => return poll,
        }

        let result = match self.outcome.as_mut() {
            Some(outcome) => ready!(outcome.poll_unpin(cx)),
            None => Ok(Ok(())),
        };
        self.outcome = None;
        self.finished = true;

        match result {
            Ok(Ok(())) => Poll::Ready(None),
            Ok(Err(reason)) => {
                self.failed = true;
                Poll::Ready(Some(Err(io::Error::other(reason))))
            }
            Err(_) => {
                self.failed = true;
                Poll::Ready(Some(Err(io::Error::other("archive writer stopped"))))
            }
        }
    }
}

impl<R> Drop for ArchiveStream<R> {
    fn drop(&mut self) {
        if self.failed {
            debug!("aborted {}", self.file_name);
        } else if self.finished {
            debug!("sent {}", self.file_name);
        } else {
            debug!("client disconnected while receiving {}", self.file_name);
        }
    }
}

/// Compresses `sources` on a blocking task while the returned stream reads
/// the output.
///
/// Must be called from within a Tokio runtime.
pub fn stream_archive(
    sources: Vec<ArchiveSource>,
    compression_level: u8,
    file_name: String,
) -> ArchiveStream<DuplexStream> {
    let (reader, writer) = tokio::io::duplex(PIPE_CAPACITY);
    let writer = SyncIoBridge::new(writer);
    let (done, outcome) = oneshot::channel();
    let name = file_name.clone();

    tokio::task::spawn_blocking(move || {
        let result = archive::write_archive(writer, &sources, compression_level);
        match &result {
            Ok(report) => info!(
                "streamed {name} ({} entries, {} bytes in {:?})",
                report.entries(),
                report.bytes_compressed,
                report.duration
            ),
            Err(err) if done.is_closed() => debug!("streaming {name} stopped: {err}"),
            Err(err) => warn!("streaming {name} failed: {err}"),
        }
        let _ = done.send(result.map(|_| ()).map_err(|e| e.to_string()));
    });

    ArchiveStream::new(reader, file_name, None).with_outcome(outcome)
}
