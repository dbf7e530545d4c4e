//! On-the-fly conversion streamed straight to the client.
//!
//! One encoder process per request. Its stdout becomes the response body;
//! the process is owned by the body stream, so dropping the response
//! (client gone, server shutting down) kills the encoder.

use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use tokio::process::ChildStdout;
use tokio_util::io::ReaderStream;
use vidshelf_av::{TemplateContext, TranscodeProcess};
use vidshelf_common::{Error, Result, VideoRecord};

use crate::config::TranscodeConfig;

/// Map a codec name to the encoder that produces it.
pub fn encoder_for(codec: &str) -> &str {
    match codec.to_ascii_lowercase().as_str() {
        "h264" | "avc" => "libx264",
        "hevc" | "h265" => "libx265",
        "vp9" => "libvpx-vp9",
        "vp8" => "libvpx",
        "av1" => "libsvtav1",
        _ => codec,
    }
}

/// Launches the encoder and wires its output into a response.
#[derive(Debug, Clone)]
pub struct TranscodeStreamer {
    program: PathBuf,
    args: Vec<String>,
    native_codec: String,
    content_type: String,
    chunk_size: usize,
}

impl TranscodeStreamer {
    pub fn new(
        program: PathBuf,
        config: &TranscodeConfig,
        native_codec: impl Into<String>,
        chunk_size: usize,
    ) -> Self {
        Self {
            program,
            args: config.args.clone(),
            native_codec: native_codec.into(),
            content_type: config.content_type.clone(),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Substituted argument list for converting `input`.
    pub fn command_args(&self, input: &Path) -> Vec<String> {
        let ctx = TemplateContext::new()
            .with_input(input)
            .with_var("encoder", encoder_for(&self.native_codec))
            .with_var("codec", &self.native_codec);
        ctx.substitute_all(&self.args)
    }

    /// Start converting `record` and return a response streaming the output.
    ///
    /// The status line is only committed once the encoder has produced its
    /// first bytes. An encoder that dies before that yields an error here
    /// (500); a failure afterwards truncates the body.
    pub async fn stream(&self, record: &VideoRecord) -> Result<Response> {
        let input = record.path.as_path();
        ensure_file(input).await?;

        let args = self.command_args(input);
        let mut process = TranscodeProcess::spawn(&self.program, &args, input)?;
        let stdout = process
            .take_stdout()
            .ok_or_else(|| Error::Internal("encoder stdout unavailable".into()))?;
        let mut output = ReaderStream::with_capacity(stdout, self.chunk_size);

        tracing::info!(
            pid = ?process.id(),
            input = %input.display(),
            codec = record.codec.as_deref().unwrap_or("unknown"),
            target = %self.native_codec,
            "Transcoding"
        );

        let first = match output.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => {
                tracing::error!(input = %input.display(), "Reading encoder output failed: {e}");
                return Err(Error::from(e));
            }
            None => {
                if let Err(e) = process.finish().await {
                    tracing::error!(input = %input.display(), "Encoder failed before output: {e}");
                    return Err(e);
                }
                None
            }
        };

        let body = transcode_body(process, output, first, input.to_path_buf());

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, self.content_type.as_str())
            .header(header::CACHE_CONTROL, "no-store")
            .body(body)
            .map_err(|e| Error::Internal(format!("failed to build response: {e}")))
    }
}

async fn ensure_file(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(Error::not_found("file", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::not_found("file", path.display()))
        }
        Err(e) => Err(Error::from(e)),
    }
}

/// The body owns the process. A body that is dropped early drops the
/// process with it, which kills the encoder.
fn transcode_body(
    mut process: TranscodeProcess,
    mut output: ReaderStream<ChildStdout>,
    first: Option<Bytes>,
    input: PathBuf,
) -> Body {
    let stream = async_stream::stream! {
        if let Some(chunk) = first {
            yield Ok::<Bytes, std::io::Error>(chunk);
        }

        while let Some(item) = output.next().await {
            match item {
                Ok(chunk) => yield Ok(chunk),
                Err(e) => {
                    tracing::error!(input = %input.display(), "Reading encoder output failed: {e}");
                    yield Err(e);
                    return;
                }
            }
        }
        drop(output);

        match process.finish().await {
            Ok(()) => tracing::info!(input = %input.display(), "Transcode complete"),
            Err(e) => {
                tracing::error!(input = %input.display(), "Transcode failed mid-stream: {e}");
                yield Err(std::io::Error::other(e.to_string()));
            }
        }
    };

    Body::from_stream(stream)
}
