//! Direct byte streaming with HTTP range support.
//!
//! Reads go through a `ReaderStream` in fixed-size chunks, so memory stays
//! bounded regardless of file size and a slow client stalls the file reads
//! rather than growing a buffer.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use vidshelf_common::paths::content_type_for;
use vidshelf_common::{Error, Result};

use super::range::{parse_range, ByteRange, RangeOutcome};

/// Serves a file's bytes, whole or as a single range.
#[derive(Debug, Clone)]
pub struct DirectStreamer {
    chunk_size: usize,
}

impl DirectStreamer {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Build the response for `path`, honouring `range_header`.
    ///
    /// Fails with [`Error::NotFound`] when the file is missing and with
    /// [`Error::UnsatisfiableRange`] when the header cannot be honoured.
    pub async fn stream(&self, path: &Path, range_header: Option<&str>) -> Result<Response> {
        let (file, total) = open_file(path).await?;
        let content_type = content_type_for(path);

        match parse_range(range_header, total) {
            RangeOutcome::NoRange => {
                tracing::debug!(path = %path.display(), total, "Serving full file");
                let body = self.body(file, total, path);

                Response::builder()
                    .status(StatusCode::OK)
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_LENGTH, total)
                    .header(header::ACCEPT_RANGES, "bytes")
                    .body(body)
                    .map_err(|e| Error::Internal(format!("failed to build response: {e}")))
            }
            RangeOutcome::Satisfied(range) => {
                tracing::debug!(
                    path = %path.display(),
                    start = range.start,
                    end = range.end,
                    total,
                    "Serving byte range"
                );
                let file = seek_to(file, &range, path).await?;
                let body = self.body(file, range.length(), path);

                Response::builder()
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_LENGTH, range.length())
                    .header(header::CONTENT_RANGE, range.content_range())
                    .header(header::ACCEPT_RANGES, "bytes")
                    .body(body)
                    .map_err(|e| Error::Internal(format!("failed to build response: {e}")))
            }
            RangeOutcome::Unsatisfiable => {
                tracing::debug!(
                    path = %path.display(),
                    range = ?range_header,
                    total,
                    "Unsatisfiable range"
                );
                Err(Error::UnsatisfiableRange { total })
            }
        }
    }

    /// Stream exactly `length` bytes from the file's current position.
    fn body(&self, file: File, length: u64, path: &Path) -> Body {
        let path: PathBuf = path.to_path_buf();
        let stream = ReaderStream::with_capacity(file.take(length), self.chunk_size)
            .inspect_err(move |e| {
                tracing::error!(path = %path.display(), "Read failed mid-stream: {e}");
            });
        Body::from_stream(stream)
    }
}

/// Open `path` and return the handle together with its size.
async fn open_file(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::not_found("file", path.display()),
        _ => Error::from(e),
    })?;

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(Error::not_found("file", path.display()));
    }

    Ok((file, metadata.len()))
}

async fn seek_to(mut file: File, range: &ByteRange, path: &Path) -> Result<File> {
    file.seek(SeekFrom::Start(range.start)).await.map_err(|e| {
        tracing::error!(path = %path.display(), "Seek to {} failed: {e}", range.start);
        Error::from(e)
    })?;
    Ok(file)
}
