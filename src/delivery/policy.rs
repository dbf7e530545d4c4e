//! Choosing between direct byte streaming and on-the-fly transcoding.

use vidshelf_common::VideoRecord;

/// How a video is delivered to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Serve the file's bytes as-is, with range support.
    Direct,
    /// Pipe the file through the transcoder; no range support.
    Transcode,
}

/// Decides delivery mode from a record's codec label.
///
/// Records without codec metadata, or whose codec matches the client's
/// native codec (compared case-insensitively), are served directly.
#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    native_codec: String,
}

impl DeliveryPolicy {
    pub fn new(native_codec: impl Into<String>) -> Self {
        Self {
            native_codec: native_codec.into().trim().to_string(),
        }
    }

    pub fn native_codec(&self) -> &str {
        &self.native_codec
    }

    pub fn decide(&self, record: &VideoRecord) -> DeliveryDecision {
        match record.codec.as_deref().map(str::trim) {
            None | Some("") => DeliveryDecision::Direct,
            Some(codec) if codec.eq_ignore_ascii_case(&self.native_codec) => {
                DeliveryDecision::Direct
            }
            Some(_) => DeliveryDecision::Transcode,
        }
    }
}
