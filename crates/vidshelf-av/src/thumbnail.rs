//! Thumbnail extraction via ffmpeg.

use std::path::{Path, PathBuf};
use std::time::Duration;

use vidshelf_common::Result;

use crate::ToolCommand;

const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(60);

/// Offset of the extracted frame, past any leading black frames.
const THUMBNAIL_OFFSET: &str = "00:00:01";

/// Grab a single frame from `input` one second in and write it as a JPEG
/// to `output`. Existing files are never overwritten.
pub async fn extract_thumbnail(ffmpeg: &Path, input: &Path, output: &Path) -> Result<()> {
    ToolCommand::new(PathBuf::from(ffmpeg))
        .args(thumbnail_args(input, output))
        .timeout(THUMBNAIL_TIMEOUT)
        .execute()
        .await?;
    Ok(())
}

fn thumbnail_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-n".into(),
        "-i".into(),
        input.display().to_string(),
        "-ss".into(),
        THUMBNAIL_OFFSET.into(),
        "-vframes".into(),
        "1".into(),
        "-q:v".into(),
        "2".into(),
        output.display().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_seek_one_second_and_take_one_frame() {
        let args = thumbnail_args(Path::new("/v/a.mp4"), Path::new("/t/a.mp4.jpg"));
        let joined = args.join(" ");
        assert!(joined.contains("-i /v/a.mp4 -ss 00:00:01 -vframes 1 -q:v 2"));
        assert_eq!(args.last().map(String::as_str), Some("/t/a.mp4.jpg"));
        assert!(args.contains(&"-n".to_string()));
    }
}
