//! Unified error type for vidshelf.
//!
//! Every failure in the delivery path funnels into [`Error`], which carries
//! enough context for the HTTP layer to pick a status via
//! [`Error::http_status`].

use std::fmt;

/// Unified error type covering all failure modes in vidshelf.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "video", "file").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation conflicts with one already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested byte range lies outside the resource.
    #[error("Range not satisfiable for resource of {total} bytes")]
    UnsatisfiableRange {
        /// Total size of the resource in bytes.
        total: u64,
    },

    /// An external tool (ffmpeg, ffprobe) failed to spawn or exited non-zero.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Reading or writing the video manifest failed.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::Conflict(_) => 409,
            Error::UnsatisfiableRange { .. } => 416,
            Error::Tool { .. } => 500,
            Error::Io { .. } => 500,
            Error::Manifest(_) => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::Validation(_) => "invalid_request",
            Error::Conflict(_) => "conflict",
            Error::UnsatisfiableRange { .. } => "range_not_satisfiable",
            Error::Tool { .. } => "upstream_process_failure",
            Error::Io { .. } => "io_error",
            Error::Manifest(_) => "manifest_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Convenience constructor for [`Error::Manifest`].
    pub fn manifest(msg: impl Into<String>) -> Self {
        Error::Manifest(msg.into())
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
