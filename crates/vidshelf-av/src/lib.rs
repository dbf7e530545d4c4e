//! # vidshelf-av
//!
//! External media tool plumbing for vidshelf.
//!
//! This crate provides:
//! - Tool discovery for ffmpeg/ffprobe ([`ToolRegistry`])
//! - Run-to-completion tool invocations with timeouts ([`ToolCommand`])
//! - `{var}` substitution for configurable argument lists ([`TemplateContext`])
//! - Long-lived transcoder children whose stdout is consumed as a stream
//!   ([`TranscodeProcess`])
//! - Codec probing and thumbnail extraction for the library scanner
//!
//! ## Example
//!
//! ```no_run
//! use vidshelf_av::{ToolRegistry, ToolsConfig};
//! use std::path::Path;
//!
//! # async fn example() -> vidshelf_common::Result<()> {
//! let tools = ToolRegistry::discover(&ToolsConfig::default());
//! let ffprobe = tools.require("ffprobe")?;
//! let codec = vidshelf_av::probe_codec(&ffprobe.path, Path::new("/videos/a.mp4")).await?;
//! println!("codec: {codec:?}");
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod probe;
pub mod template;
pub mod thumbnail;
pub mod tools;
pub mod transcode;

pub use command::{ToolCommand, ToolOutput};
pub use probe::probe_codec;
pub use template::TemplateContext;
pub use thumbnail::extract_thumbnail;
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, ToolsConfig};
pub use transcode::TranscodeProcess;
