use crate::config::Config;
use crate::delivery::{video_router, DeliveryEngine};
use crate::manifest::ManifestStore;
use anyhow::{Context, Result};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use vidshelf_av::ToolRegistry;

pub mod error;
pub mod routes_library;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Current video manifest
    pub manifest: Arc<ManifestStore>,
    /// Serves `GET /video`
    pub engine: Arc<DeliveryEngine>,
    /// External tools found at startup
    pub tools: Arc<ToolRegistry>,
    /// Held while a library sync runs
    pub scan_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppContext {
    /// Discover tools and load the manifest named in `config`.
    pub fn new(config: Config) -> Result<Self> {
        let tools = ToolRegistry::discover(&config.tools);
        let manifest = ManifestStore::open(&config.library.manifest_path).with_context(|| {
            format!(
                "Failed to load manifest {}",
                config.library.manifest_path.display()
            )
        })?;
        Ok(Self::with_parts(config, Arc::new(manifest), tools))
    }

    /// Assemble a context from already-built parts.
    pub fn with_parts(config: Config, manifest: Arc<ManifestStore>, tools: ToolRegistry) -> Self {
        let program = transcode_program(&config, &tools);
        tracing::debug!("Transcoder: {}", program.display());

        let engine = DeliveryEngine::new(
            manifest.clone(),
            &config.delivery,
            &config.transcode,
            program,
        );

        Self {
            config: Arc::new(config),
            manifest,
            engine: Arc::new(engine),
            tools: Arc::new(tools),
            scan_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

/// Configured encoder, else the discovered ffmpeg, else `ffmpeg` from PATH
/// at spawn time.
fn transcode_program(config: &Config, tools: &ToolRegistry) -> PathBuf {
    config
        .transcode
        .program
        .clone()
        .or_else(|| tools.get("ffmpeg").map(|t| t.path.clone()))
        .unwrap_or_else(|| PathBuf::from("ffmpeg"))
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    let public_dir = ctx.config.server.public_dir.clone();
    let thumbnail_dir = ctx.config.library.thumbnail_dir.clone();

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(video_router())
        .merge(routes_library::library_routes())
        .nest_service("/thumbnails", ServeDir::new(thumbnail_dir));

    // Browser UI, attached before the layers so it is traced too
    if let Some(dir) = public_dir {
        if dir.exists() {
            tracing::info!("Serving static files from {:?}", dir);
            app = app.fallback_service(ServeDir::new(&dir).append_index_html_on_directories(true));
        }
    }

    app.layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::new(config)?;
    tracing::info!("{} videos in manifest", ctx.manifest.len());

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;
    use vidshelf_common::VideoRecord;

    fn context(dir: &std::path::Path) -> AppContext {
        let mut config = Config::default();
        config.server.public_dir = None;
        config.library.thumbnail_dir = dir.join("thumbs");
        let manifest = ManifestStore::with_records(
            dir.join("manifest.json"),
            vec![VideoRecord::new(dir.join("a.mp4"))],
        );
        AppContext::with_parts(config, Arc::new(manifest), ToolRegistry::default())
    }

    #[test]
    fn configured_program_wins() {
        let mut config = Config::default();
        config.transcode.program = Some(PathBuf::from("/opt/enc"));
        assert_eq!(
            transcode_program(&config, &ToolRegistry::default()),
            PathBuf::from("/opt/enc")
        );
        assert_eq!(
            transcode_program(&Config::default(), &ToolRegistry::default()),
            PathBuf::from("ffmpeg")
        );
    }

    #[tokio::test]
    async fn health_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(context(dir.path()));

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn video_without_identifier_is_400() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(context(dir.path()));

        let resp = app
            .oneshot(Request::get("/video").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn manifest_listing() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(context(dir.path()));

        let resp = app
            .oneshot(
                Request::get("/video-manifest.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = http_body_util::BodyExt::collect(resp.into_body())
            .await
            .unwrap()
            .to_bytes();
        let records: Vec<VideoRecord> = serde_json::from_slice(&body).unwrap();
        assert_eq!(records.len(), 1);
    }
}
