//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which owns a temporary directory holding the
//! media files and the manifest, plus a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;
use vidshelf::config::Config;
use vidshelf::manifest::ManifestStore;
use vidshelf::server::{create_router, AppContext};
use vidshelf_av::ToolRegistry;
use vidshelf_common::VideoRecord;

/// Test harness wrapping a fully-constructed [`AppContext`] whose manifest,
/// thumbnails and media live in a temporary directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
}

/// Config pointing every path into `dir`. Transcoding runs `cat {input}`,
/// so "converted" output equals the source bytes.
pub fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.server.public_dir = None;
    config.library.manifest_path = dir.join("video-manifest.json");
    config.library.thumbnail_dir = dir.join("thumbnails");
    config.library.roots = vec![dir.join("media")];
    config.library.thumbnails = false;
    config.library.probe_codecs = false;
    config.transcode.program = Some(PathBuf::from("cat"));
    config.transcode.args = vec!["{input}".to_string()];
    config
}

impl TestHarness {
    /// Create a harness with the default test configuration and no videos.
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Create a harness after letting `configure` adjust the test config.
    pub fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("media")).expect("failed to create media dir");

        let mut config = test_config(dir.path());
        configure(&mut config);

        let manifest = Arc::new(ManifestStore::with_records(
            config.library.manifest_path.clone(),
            Vec::new(),
        ));
        let ctx = AppContext::with_parts(config, manifest, ToolRegistry::default());

        Self { ctx, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    /// Start an Axum server with an adjusted config on a random port.
    pub async fn with_server_config(configure: impl FnOnce(&mut Config)) -> (Self, SocketAddr) {
        Self::with_config(configure).serve().await
    }

    async fn serve(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    /// Router for in-process requests via `tower::ServiceExt::oneshot`.
    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Directory the scanner roots at.
    pub fn media_dir(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    /// Write `data` to `media/<name>` and append it to the manifest.
    /// Returns the new record's index.
    pub fn add_video(&self, name: &str, codec: Option<&str>, data: &[u8]) -> usize {
        let path = self.media_dir().join(name);
        std::fs::write(&path, data).expect("failed to write video");

        let mut record = VideoRecord::new(path);
        record.codec = codec.map(str::to_string);
        self.add_record(record)
    }

    /// Append `record` to the manifest as-is. Returns its index.
    pub fn add_record(&self, record: VideoRecord) -> usize {
        let mut records = self.ctx.manifest.snapshot().as_ref().clone();
        records.push(record);
        let index = records.len() - 1;
        self.ctx
            .manifest
            .replace(records)
            .expect("failed to write manifest");
        index
    }

    /// Path of the manifest record at `index`.
    pub fn video_path(&self, index: usize) -> PathBuf {
        self.ctx.manifest.snapshot()[index].path.clone()
    }
}

/// Deterministic, position-dependent bytes.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..=255u8).cycle().take(len).collect()
}
