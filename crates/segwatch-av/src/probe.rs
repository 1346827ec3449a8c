//! FFprobe-based duration probing.

use crate::command::ToolCommand;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Probing a single file should never take long.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Measure the container duration of a media file.
///
/// # Errors
///
/// Fails if the file does not exist, ffprobe cannot read it, or the output
/// carries no usable duration.
pub async fn probe_duration(ffprobe: &Path, path: &Path) -> Result<Duration> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = build_probe_command(ffprobe, path).execute().await?;
    parse_duration_output(&output.stdout)
}

/// The ffprobe invocation reporting the container duration of `path` as JSON.
///
/// Like every tool run during a batch it gets its own process group, so a
/// terminal Ctrl-C does not cut a probe short.
pub fn build_probe_command(ffprobe: &Path, path: &Path) -> ToolCommand {
    let mut cmd = ToolCommand::new(ffprobe.to_path_buf());
    cmd.timeout(PROBE_TIMEOUT).own_process_group();
    cmd.args(["-v", "error", "-show_entries", "format=duration", "-of", "json"]);
    cmd.arg(path.to_string_lossy());
    cmd
}

fn parse_duration_output(json: &str) -> Result<Duration> {
    let output: FfprobeOutput = serde_json::from_str(json)?;

    let secs = output
        .format
        .duration
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| Error::parse_error("ffprobe", "no duration reported"))?;

    if !secs.is_finite() || secs < 0.0 {
        return Err(Error::parse_error(
            "ffprobe",
            format!("invalid duration: {secs}"),
        ));
    }

    Ok(Duration::from_secs_f64(secs))
}
