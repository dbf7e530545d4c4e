//! Vidshelf-Common: shared types and utilities.
//!
//! - **Identities**: [`VideoIdentity`] unifies path- and index-based lookups
//! - **Records**: [`VideoRecord`], one entry of the video manifest
//! - **Path Utilities**: video extension checks and MIME type resolution
//! - **Error Handling**: the unified [`Error`] type and its HTTP mapping
//!
//! # Examples
//!
//! ```
//! use vidshelf_common::{Error, Result, VideoIdentity};
//! use vidshelf_common::paths::content_type_for;
//! use std::path::Path;
//!
//! let id = VideoIdentity::from_query(Some("3"), None).unwrap();
//! assert_eq!(id, VideoIdentity::ById(3));
//!
//! assert_eq!(content_type_for(Path::new("clip.mp4")), "video/mp4");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("video", "missing.mp4"))
//! }
//! assert_eq!(example().unwrap_err().http_status(), 404);
//! ```

pub mod error;
pub mod identity;
pub mod paths;
pub mod record;

pub use error::{Error, Result};
pub use identity::VideoIdentity;
pub use record::VideoRecord;
