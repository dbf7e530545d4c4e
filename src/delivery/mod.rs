//! Video delivery: decides per request whether to send a file's bytes as
//! they are or to convert them on the fly, then streams the result.

pub mod direct;
pub mod policy;
pub mod range;
pub mod transcode;

pub use direct::DirectStreamer;
pub use policy::{DeliveryDecision, DeliveryPolicy};
pub use range::{parse_range, ByteRange, RangeOutcome};
pub use transcode::{encoder_for, TranscodeStreamer};

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};
use serde::Deserialize;
use vidshelf_common::{Result, VideoIdentity};

use crate::config::{DeliveryConfig, TranscodeConfig};
use crate::manifest::ManifestLookup;
use crate::server::error::AppError;
use crate::server::AppContext;

/// Resolves a request to a manifest record and produces the response.
pub struct DeliveryEngine {
    manifest: Arc<dyn ManifestLookup>,
    policy: DeliveryPolicy,
    direct: DirectStreamer,
    transcoder: TranscodeStreamer,
}

impl DeliveryEngine {
    /// `program` is the encoder executable used for conversions.
    pub fn new(
        manifest: Arc<dyn ManifestLookup>,
        delivery: &DeliveryConfig,
        transcode: &TranscodeConfig,
        program: PathBuf,
    ) -> Self {
        Self {
            manifest,
            policy: DeliveryPolicy::new(delivery.native_codec.clone()),
            direct: DirectStreamer::new(delivery.chunk_size),
            transcoder: TranscodeStreamer::new(
                program,
                transcode,
                delivery.native_codec.clone(),
                delivery.chunk_size,
            ),
        }
    }

    /// Serve the video named by `identity`.
    ///
    /// `range` is only honoured for direct delivery; converted output has
    /// no stable length to slice.
    pub async fn deliver(&self, identity: &VideoIdentity, range: Option<&str>) -> Result<Response> {
        let record = self.manifest.lookup(identity)?;

        match self.policy.decide(&record) {
            DeliveryDecision::Direct => {
                tracing::debug!(video = %identity, path = %record.path.display(), "Direct delivery");
                self.direct.stream(&record.path, range).await
            }
            DeliveryDecision::Transcode => {
                tracing::debug!(
                    video = %identity,
                    codec = record.codec.as_deref().unwrap_or_default(),
                    target = self.policy.native_codec(),
                    "Transcoded delivery"
                );
                if range.is_some() {
                    tracing::debug!(video = %identity, "Ignoring Range header for transcoded delivery");
                }
                self.transcoder.stream(&record).await
            }
        }
    }
}

impl std::fmt::Debug for DeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEngine")
            .field("policy", &self.policy)
            .field("direct", &self.direct)
            .field("transcoder", &self.transcoder)
            .finish_non_exhaustive()
    }
}

/// Query string of `GET /video`.
#[derive(Debug, Default, Deserialize)]
pub struct VideoQuery {
    pub id: Option<String>,
    pub path: Option<String>,
}

/// GET /video?id=<n> or GET /video?path=<p>
pub async fn stream_video(
    State(ctx): State<AppContext>,
    Query(query): Query<VideoQuery>,
    headers: HeaderMap,
) -> std::result::Result<Response, AppError> {
    let identity = VideoIdentity::from_query(query.id.as_deref(), query.path.as_deref())?;

    // A Range header that is not valid text is malformed, not absent.
    let range = headers
        .get(header::RANGE)
        .map(|v| v.to_str().unwrap_or_default());

    Ok(ctx.engine.deliver(&identity, range).await?)
}

/// Create the video delivery router.
pub fn video_router() -> Router<AppContext> {
    Router::new().route("/video", get(stream_video))
}
