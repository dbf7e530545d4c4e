//! Path utilities: video extension detection and MIME type resolution.

use std::path::Path;

/// Extensions picked up by the library scanner when none are configured.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "mov"];

/// Fallback MIME type for files with an unknown extension.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lowercased extension of `path`, if it has a UTF-8 one.
pub fn extension_lowercase(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Check if `path` carries one of the given extensions (case-insensitive).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vidshelf_common::paths::has_extension;
///
/// let exts = ["mp4".to_string(), "mov".to_string()];
/// assert!(has_extension(Path::new("/v/Clip.MOV"), &exts));
/// assert!(!has_extension(Path::new("/v/notes.txt"), &exts));
/// ```
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    extension_lowercase(path)
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
        .unwrap_or(false)
}

/// Resolve the `Content-Type` for a media file from its extension.
///
/// Known video containers map to their canonical MIME type; anything else
/// is served as `application/octet-stream`.
pub fn content_type_for(path: &Path) -> &'static str {
    match extension_lowercase(path).as_deref() {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg" | "ogv") => "video/ogg",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        Some("ts" | "m2ts") => "video/mp2t",
        Some("wmv") => "video/x-ms-wmv",
        Some("flv") => "video/x-flv",
        _ => OCTET_STREAM,
    }
}
