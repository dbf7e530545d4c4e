//! Library routes: manifest listing, the disable toggle and rescans.

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::path::PathBuf;
use vidshelf_common::{Error, VideoRecord};

use super::error::AppError;
use super::AppContext;
use crate::scanner::{sync_library, Scanner};

/// Create library routes.
pub fn library_routes() -> Router<AppContext> {
    Router::new()
        .route("/video-manifest.json", get(list_videos))
        .route("/toggle-video-status", post(toggle_video_status))
        .route("/sync", post(sync))
}

/// Body of `POST /toggle-video-status`.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(rename = "videoPath")]
    pub video_path: Option<String>,
    pub disabled: Option<bool>,
}

/// GET /video-manifest.json
async fn list_videos(State(ctx): State<AppContext>) -> Json<Vec<VideoRecord>> {
    Json(ctx.manifest.snapshot().as_ref().clone())
}

/// POST /toggle-video-status
async fn toggle_video_status(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    let request: ToggleRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::validation(format!("invalid request body: {e}")))?;

    let (Some(video_path), Some(disabled)) = (request.video_path, request.disabled) else {
        return Err(Error::validation("Missing videoPath or disabled status").into());
    };
    if video_path.is_empty() {
        return Err(Error::validation("Missing videoPath or disabled status").into());
    }

    let manifest = ctx.manifest.clone();
    tokio::task::spawn_blocking(move || manifest.set_disabled(&PathBuf::from(video_path), disabled))
        .await
        .map_err(|e| Error::Internal(format!("toggle task failed: {e}")))??;

    Ok("Video status updated")
}

/// POST /sync
async fn sync(State(ctx): State<AppContext>) -> Result<&'static str, AppError> {
    let Ok(_guard) = ctx.scan_lock.try_lock() else {
        return Err(Error::Conflict("a library sync is already running".into()).into());
    };

    let scanner = Scanner::new(ctx.config.library.clone(), &ctx.tools);
    let summary = sync_library(&ctx.manifest, &scanner).await?;
    tracing::info!(
        found = summary.found,
        added = summary.added,
        removed = summary.removed,
        "Sync complete"
    );

    Ok("Sync complete")
}
