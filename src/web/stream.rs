// src/web/stream.rs

//! Streams a finished archive back to the caller.

use crate::core_types::PackedArchive;
use crate::errors::{Error, Result};
use crate::workspace::Workspace;
use axum::{
    body::{Body, Bytes},
    http::{header, StatusCode},
    response::Response,
};
use futures::{Stream, StreamExt};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Media type of every successful response.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/gzip";

/// Builds the `200 OK` response streaming `archive` from disk.
///
/// The workspace travels with the body: it is removed once the last chunk has
/// been sent, or when the body is dropped early because the client went away.
///
/// # Errors
/// Returns `Error::Stream` if the archive cannot be opened. The workspace is
/// removed in that case as well.
pub async fn send(archive: PackedArchive) -> Result<Response> {
    let stream_error = |source: io::Error| Error::Stream {
        path: archive.path().display().to_string(),
        source,
    };
    let file = File::open(archive.path()).await.map_err(stream_error)?;
    let length = file.metadata().await.map_err(stream_error)?.len();

    let PackedArchive {
        workspace, name, ..
    } = archive;
    let body = Body::from_stream(WorkspaceStream {
        inner: ReaderStream::new(file),
        workspace: Some(workspace),
    });

    log::debug!("Streaming {} ({} bytes)", name, length);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", name),
        )
        .header(header::CONTENT_LENGTH, length)
        .body(body)
        .map_err(|e| Error::Internal(format!("Failed to build response: {}", e)))
}

/// File chunks that keep the workspace alive until they are exhausted.
struct WorkspaceStream {
    inner: ReaderStream<File>,
    workspace: Option<Workspace>,
}

impl Stream for WorkspaceStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = self.inner.poll_next_unpin(cx);
        if matches!(polled, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            // Done or failed: nothing else will be read from the workspace.
            drop(self.workspace.take());
        }
        polled
    }
}
