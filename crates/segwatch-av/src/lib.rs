//! # segwatch-av
//!
//! External media tool plumbing for segwatch.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolPaths`]) -- locate ffmpeg and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout
//!   support and optional process-group isolation.
//! - **Probing** ([`probe_duration`]) -- container duration via ffprobe.
//! - **Staging** ([`Workspace`]) -- temporary output directory with commit or
//!   discard semantics.
//! - **Actions** ([`actions`]) -- fixed-duration segmentation and frame
//!   extraction.
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use segwatch_av::actions::{split_into_segments, SegmentOptions};
//! use segwatch_av::ToolPaths;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # async fn example() -> segwatch_av::Result<()> {
//! let tools = ToolPaths::discover(None, None)?;
//! let opts = SegmentOptions::new(Duration::from_secs(5));
//! let input = Path::new("clip.mp4");
//! let segments = split_into_segments(&tools, input, Path::new("out"), &opts).await?;
//! println!("{} segments", segments.len());
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod command;
mod error;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use probe::probe_duration;
pub use tools::{get_tool_path, require_tool, ToolPaths};
pub use workspace::Workspace;
