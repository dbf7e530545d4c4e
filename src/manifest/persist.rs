//! Reading and writing the JSON manifest file.

use std::path::{Path, PathBuf};

use vidshelf_common::{Error, Result, VideoRecord};

/// Read the manifest at `path`. A missing file is an empty manifest.
pub fn read_manifest(path: &Path) -> Result<Vec<VideoRecord>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No manifest at {}, starting empty", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(Error::manifest(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content)
        .map_err(|e| Error::manifest(format!("failed to parse {}: {e}", path.display())))
}

/// Write `records` to `path` as pretty JSON.
///
/// The data goes to a sibling temp file first and is renamed over the
/// target, so readers never observe a half-written manifest.
pub fn write_manifest(path: &Path, records: &[VideoRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)
        .map_err(|e| Error::manifest(format!("failed to serialize manifest: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::manifest(format!("failed to create {}: {e}", parent.display()))
        })?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, json)
        .map_err(|e| Error::manifest(format!("failed to write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        Error::manifest(format!("failed to replace {}: {e}", path.display()))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "manifest.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
