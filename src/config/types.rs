use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use vidshelf_av::ToolsConfig;
use vidshelf_common::paths::DEFAULT_VIDEO_EXTENSIONS;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub transcode: TranscodeConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the browser UI (index.html, script.js, ...).
    #[serde(default = "default_public_dir")]
    pub public_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_public_dir() -> Option<PathBuf> {
    Some(PathBuf::from("./public"))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// JSON manifest of known videos.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,

    /// Where the scanner writes thumbnails; served under `/thumbnails`.
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: PathBuf,

    /// Directories to scan. `~` is expanded.
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// File extensions treated as videos (without the dot).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directories whose path contains any of these fragments are skipped.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Generate thumbnails during scans (requires ffmpeg).
    #[serde(default = "default_true")]
    pub thumbnails: bool,

    /// Record each file's video codec during scans (requires ffprobe).
    #[serde(default = "default_true")]
    pub probe_codecs: bool,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("./public/video-manifest.json")
}
fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("./public/thumbnails")
}
fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("~")]
}
fn default_extensions() -> Vec<String> {
    DEFAULT_VIDEO_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
fn default_exclude() -> Vec<String> {
    ["node_modules", ".git", "Library", "Application Support"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_true() -> bool {
    true
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            thumbnail_dir: default_thumbnail_dir(),
            roots: default_roots(),
            extensions: default_extensions(),
            exclude: default_exclude(),
            thumbnails: true,
            probe_codecs: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
    /// The one codec the client can decode without server-side conversion.
    #[serde(default = "default_native_codec")]
    pub native_codec: String,

    /// Read size for direct and transcoded streaming, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_native_codec() -> String {
    "h264".to_string()
}
fn default_chunk_size() -> usize {
    64 * 1024
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            native_codec: default_native_codec(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscodeConfig {
    /// Encoder executable. Defaults to the discovered ffmpeg.
    #[serde(default)]
    pub program: Option<PathBuf>,

    /// Argument template. Variables: `{input}`, `{encoder}`, `{codec}`,
    /// plus `{filename}`, `{filestem}`, `{extension}`, `{dirname}`.
    #[serde(default = "default_transcode_args")]
    pub args: Vec<String>,

    /// `Content-Type` of the encoder's output.
    #[serde(default = "default_transcode_content_type")]
    pub content_type: String,
}

/// Fragmented MP4 on stdout, so the browser can start playing before the
/// encode finishes.
fn default_transcode_args() -> Vec<String> {
    [
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostdin",
        "-i",
        "{input}",
        "-map",
        "0:v:0",
        "-map",
        "0:a:0?",
        "-c:v",
        "{encoder}",
        "-preset",
        "veryfast",
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-movflags",
        "frag_keyframe+empty_moov+default_base_moof",
        "-f",
        "mp4",
        "pipe:1",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_transcode_content_type() -> String {
    "video/mp4".to_string()
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: default_transcode_args(),
            content_type: default_transcode_content_type(),
        }
    }
}
