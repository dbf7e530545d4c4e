//! Video identity resolution.
//!
//! Clients address a video either by its absolute filesystem path or by its
//! position in the manifest. Both schemes are folded into
//! [`VideoIdentity`] once, at the edge, so lookups downstream only ever see
//! a single type.

use std::fmt;
use std::path::PathBuf;

use crate::{Error, Result};

/// How a request identifies a video in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoIdentity {
    /// Absolute filesystem path of the video.
    ByPath(PathBuf),
    /// Zero-based index into the manifest's ordered record list.
    ById(usize),
}

impl VideoIdentity {
    /// Build an identity from the raw `id` / `path` query parameters.
    ///
    /// Exactly one of the two must be present. `id` must consist solely of
    /// ASCII digits; `path` must be non-empty.
    pub fn from_query(id: Option<&str>, path: Option<&str>) -> Result<Self> {
        match (id, path) {
            (Some(_), Some(_)) => Err(Error::validation(
                "specify either `id` or `path`, not both",
            )),
            (Some(raw), None) => parse_index(raw).map(VideoIdentity::ById),
            (None, Some(raw)) => {
                if raw.trim().is_empty() {
                    return Err(Error::validation("`path` must not be empty"));
                }
                Ok(VideoIdentity::ByPath(PathBuf::from(raw)))
            }
            (None, None) => Err(Error::validation(
                "missing video identifier: expected `id` or `path`",
            )),
        }
    }
}

fn parse_index(raw: &str) -> Result<usize> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!(
            "`id` must be a non-negative integer, got {raw:?}"
        )));
    }
    raw.parse::<usize>()
        .map_err(|_| Error::validation(format!("`id` out of range: {raw}")))
}

impl fmt::Display for VideoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoIdentity::ByPath(path) => write!(f, "{}", path.display()),
            VideoIdentity::ById(id) => write!(f, "#{id}"),
        }
    }
}
