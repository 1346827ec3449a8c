//! External tool detection.
//!
//! Segmentation needs `ffmpeg` for the split itself and `ffprobe` to measure
//! what came out. Both are resolved once at startup so a missing tool is a
//! configuration problem rather than a per-file failure.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolved locations of the tools the pipeline shells out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// Path to the `ffmpeg` executable.
    pub ffmpeg: PathBuf,
    /// Path to the `ffprobe` executable.
    pub ffprobe: PathBuf,
}

impl ToolPaths {
    /// Resolve both tools, preferring configured paths over `PATH` lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] for the first tool that cannot be found.
    pub fn discover(ffmpeg: Option<&Path>, ffprobe: Option<&Path>) -> Result<Self> {
        Ok(Self {
            ffmpeg: get_tool_path("ffmpeg", ffmpeg)?,
            ffprobe: get_tool_path("ffprobe", ffprobe)?,
        })
    }

    /// Version banner of each tool, for startup diagnostics.
    pub fn versions(&self) -> Vec<(&'static str, Option<String>)> {
        vec![
            ("ffmpeg", detect_version(&self.ffmpeg)),
            ("ffprobe", detect_version(&self.ffprobe)),
        ]
    }
}

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        #[cfg(feature = "tracing")]
        tracing::warn!(
            "Configured {} path {:?} does not exist, falling back to PATH",
            name,
            path
        );
    }

    require_tool(name)
}

/// Run `<tool> -version` and return the first line of stdout.
///
/// ffmpeg and ffprobe both use the single-dash form.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
