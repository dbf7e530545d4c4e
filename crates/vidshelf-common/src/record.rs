//! The manifest record for a single video.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One entry of the video manifest.
///
/// Serialized with the field names the browser UI expects
/// (`path`, `disabled`, `thumbnail`, `codec`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Absolute filesystem path of the video.
    pub path: PathBuf,

    /// Hidden from the UI listing when set.
    #[serde(default)]
    pub disabled: bool,

    /// Web path of the generated thumbnail (empty when none exists).
    #[serde(default, rename = "thumbnail")]
    pub thumbnail_path: String,

    /// Codec label of the primary video stream, e.g. `"h264"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

impl VideoRecord {
    /// Create an enabled record with no thumbnail and no codec metadata.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            disabled: false,
            thumbnail_path: String::new(),
            codec: None,
        }
    }

    /// Builder-style setter for the codec label.
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }
}
