//! Video library scanner.
//!
//! Walks the configured roots for video files, keeps the `disabled` flag of
//! videos already in the manifest, and optionally records each file's codec
//! and a thumbnail.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use vidshelf_av::{extract_thumbnail, probe_codec, ToolRegistry};
use vidshelf_common::paths::has_extension;
use vidshelf_common::{Error, Result, VideoRecord};
use walkdir::{DirEntry, WalkDir};

use crate::config::LibraryConfig;
use crate::manifest::ManifestStore;

/// URL prefix under which the thumbnail directory is served.
pub const THUMBNAIL_URL_PREFIX: &str = "/thumbnails";

/// Counts from one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub found: usize,
    pub added: usize,
    pub removed: usize,
    pub probed: usize,
    pub thumbnails_created: usize,
    pub thumbnails_failed: usize,
}

/// Find every video file below the configured roots, sorted by path.
///
/// Unreadable entries are skipped. Directories whose path contains one of
/// the exclusion fragments are not descended into.
pub fn discover_videos(library: &LibraryConfig) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for root in &library.roots {
        let root = PathBuf::from(shellexpand::tilde(&root.to_string_lossy()).as_ref());
        if !root.is_dir() {
            warn!("Library root does not exist: {:?}", root);
            continue;
        }

        info!("Scanning directory: {:?}", root);
        let walker = WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e, &library.exclude));

        for entry in walker.filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && has_extension(entry.path(), &library.extensions) {
                found.push(entry.into_path());
            }
        }
    }

    found.sort();
    found.dedup();
    found
}

fn is_excluded(entry: &DirEntry, exclude: &[String]) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let path = entry.path().to_string_lossy();
    exclude.iter().any(|fragment| path.contains(fragment.as_str()))
}

/// Builds a fresh manifest from the file system.
#[derive(Debug, Clone)]
pub struct Scanner {
    library: LibraryConfig,
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
}

impl Scanner {
    pub fn new(library: LibraryConfig, tools: &ToolRegistry) -> Self {
        let ffmpeg = tools.get("ffmpeg").map(|t| t.path.clone());
        let ffprobe = tools.get("ffprobe").map(|t| t.path.clone());

        if library.thumbnails && ffmpeg.is_none() {
            warn!("ffmpeg not found, thumbnails will not be generated");
        }
        if library.probe_codecs && ffprobe.is_none() {
            warn!("ffprobe not found, codecs will not be recorded");
        }

        Self {
            library,
            ffmpeg,
            ffprobe,
        }
    }

    /// Scan the roots and merge the result with `existing`.
    ///
    /// Videos keep their `disabled` flag and known codec; videos no longer
    /// on disk are dropped.
    pub async fn scan(&self, existing: &[VideoRecord]) -> Result<(Vec<VideoRecord>, ScanSummary)> {
        let library = self.library.clone();
        let paths = tokio::task::spawn_blocking(move || discover_videos(&library))
            .await
            .map_err(|e| Error::Internal(format!("scan task failed: {e}")))?;

        let previous: HashMap<&Path, &VideoRecord> =
            existing.iter().map(|r| (r.path.as_path(), r)).collect();

        let mut summary = ScanSummary {
            found: paths.len(),
            ..Default::default()
        };
        summary.removed = existing
            .iter()
            .filter(|r| paths.binary_search(&r.path).is_err())
            .count();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let mut record = VideoRecord::new(&path);
            match previous.get(path.as_path()) {
                Some(old) => {
                    record.disabled = old.disabled;
                    record.codec = old.codec.clone();
                }
                None => summary.added += 1,
            }

            if record.codec.is_none() {
                record.codec = self.probe(&path, &mut summary).await;
            }
            record.thumbnail_path = self.thumbnail(&path, &mut summary).await;

            records.push(record);
        }

        info!(
            found = summary.found,
            added = summary.added,
            removed = summary.removed,
            "Scan complete"
        );
        Ok((records, summary))
    }

    async fn probe(&self, path: &Path, summary: &mut ScanSummary) -> Option<String> {
        if !self.library.probe_codecs {
            return None;
        }
        let ffprobe = self.ffprobe.as_deref()?;

        match probe_codec(ffprobe, path).await {
            Ok(codec) => {
                summary.probed += 1;
                debug!(path = %path.display(), codec = ?codec, "Probed");
                codec
            }
            Err(e) => {
                warn!(path = %path.display(), "Probe failed: {e}");
                None
            }
        }
    }

    /// Ensure a thumbnail exists and return its URL, or an empty string.
    async fn thumbnail(&self, path: &Path, summary: &mut ScanSummary) -> String {
        let Some(name) = path.file_name() else {
            return String::new();
        };
        let file_name = format!("{}.jpg", name.to_string_lossy());
        let target = self.library.thumbnail_dir.join(&file_name);

        if !target.exists() && self.library.thumbnails {
            if let Some(ffmpeg) = self.ffmpeg.as_deref() {
                if let Err(e) = tokio::fs::create_dir_all(&self.library.thumbnail_dir).await {
                    warn!("Cannot create thumbnail directory {:?}: {e}", self.library.thumbnail_dir);
                    return String::new();
                }
                info!("Generating thumbnail for {}", path.display());
                match extract_thumbnail(ffmpeg, path, &target).await {
                    Ok(()) => summary.thumbnails_created += 1,
                    Err(e) => {
                        summary.thumbnails_failed += 1;
                        warn!(path = %path.display(), "Thumbnail generation failed: {e}");
                    }
                }
            }
        }

        if target.exists() {
            format!("{THUMBNAIL_URL_PREFIX}/{file_name}")
        } else {
            String::new()
        }
    }
}

/// Rescan the library and replace the manifest with the result.
///
/// `disabled` flags are taken from the manifest as it is when the result is
/// written, so a toggle that lands while the scan runs is kept.
pub async fn sync_library(store: &Arc<ManifestStore>, scanner: &Scanner) -> Result<ScanSummary> {
    let existing = store.snapshot();
    let (records, summary) = scanner.scan(&existing).await?;

    let writer = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        writer.replace_with(|current| merge_disabled(records, current))
    })
    .await
    .map_err(|e| Error::Internal(format!("manifest write task failed: {e}")))??;

    info!("Manifest written to {}", store.path().display());
    Ok(summary)
}

/// Copy the `disabled` flag of every path in `current` onto `scanned`.
fn merge_disabled(mut scanned: Vec<VideoRecord>, current: &[VideoRecord]) -> Vec<VideoRecord> {
    let flags: HashMap<&Path, bool> = current
        .iter()
        .map(|r| (r.path.as_path(), r.disabled))
        .collect();
    for record in &mut scanned {
        if let Some(&disabled) = flags.get(record.path.as_path()) {
            record.disabled = disabled;
        }
    }
    scanned
}
