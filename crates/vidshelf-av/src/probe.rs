//! Codec probing via ffprobe.

use std::path::{Path, PathBuf};
use std::time::Duration;

use vidshelf_common::Result;

use crate::ToolCommand;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Return the codec name of the first video stream in `input`.
///
/// `Ok(None)` means ffprobe succeeded but reported no video stream.
pub async fn probe_codec(ffprobe: &Path, input: &Path) -> Result<Option<String>> {
    let output = ToolCommand::new(PathBuf::from(ffprobe))
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=codec_name",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input.display().to_string())
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    Ok(parse_codec_output(&output.stdout))
}

fn parse_codec_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_ascii_lowercase)
}
