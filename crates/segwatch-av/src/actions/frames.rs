//! Still frame extraction, one frame per second of video.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;
use crate::{Error, Result};

/// Frame extraction of a short segment is quick; keep a tight bound.
const FRAMES_TIMEOUT: Duration = Duration::from_secs(300);

/// Name prefix shared by all frames extracted from `stem`.
pub fn frame_prefix(stem: &str) -> String {
    format!("{stem}_frame_")
}

/// Build the ffmpeg invocation writing `<stem>_frame_NNN.png` into `frame_dir`,
/// numbered from 0.
pub fn build_frames_command(
    ffmpeg: &Path,
    segment: &Path,
    frame_dir: &Path,
) -> Result<ToolCommand> {
    let stem = segment
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| {
            Error::InvalidInput(format!("invalid segment path: {}", segment.display()))
        })?;
    let prefix = frame_prefix(&stem).replace('%', "%%");
    let pattern = frame_dir.join(format!("{prefix}%03d.png"));

    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.timeout(FRAMES_TIMEOUT).own_process_group();
    cmd.args(["-hide_banner", "-nostdin", "-y", "-v", "error", "-i"]);
    cmd.arg(segment.to_string_lossy());
    cmd.args(["-vf", "fps=1", "-start_number", "0"]);
    cmd.arg(pattern.to_string_lossy());
    Ok(cmd)
}

/// Extract one frame per second of `segment` into `frame_dir`.
///
/// Returns the extracted frame paths in order.
pub async fn extract_frames(
    ffmpeg: &Path,
    segment: &Path,
    frame_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(frame_dir)?;

    build_frames_command(ffmpeg, segment, frame_dir)?
        .execute()
        .await?;

    let stem = segment
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let frames = list_frames(frame_dir, &stem)?;

    #[cfg(feature = "tracing")]
    tracing::debug!("Extracted {} frames from {:?}", frames.len(), segment);

    Ok(frames)
}

/// Frames previously extracted for `stem`, sorted by name.
pub fn list_frames(frame_dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
    let prefix = frame_prefix(stem);
    let mut frames: Vec<PathBuf> = std::fs::read_dir(frame_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|n| {
                    let n = n.to_string_lossy();
                    n.starts_with(&prefix) && n.ends_with(".png")
                })
                .unwrap_or(false)
        })
        .collect();
    frames.sort();
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_samples_one_frame_per_second() {
        let cmd = build_frames_command(
            Path::new("ffmpeg"),
            Path::new("/out/clip_segment_001.mp4"),
            Path::new("/frames"),
        )
        .unwrap();
        let args = cmd.get_args();
        assert!(args.windows(2).any(|w| w[0] == "-vf" && w[1] == "fps=1"));
        assert_eq!(args.last().unwrap(), "/frames/clip_segment_001_frame_%03d.png");
        assert!(cmd.runs_in_own_process_group());
    }

    #[test]
    fn list_frames_only_matches_own_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "a_segment_001_frame_001.png",
            "a_segment_001_frame_000.png",
            "a_segment_002_frame_000.png",
            "a_segment_001_frame_000.txt",
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let frames = list_frames(dir.path(), "a_segment_001").unwrap();
        let names: Vec<String> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["a_segment_001_frame_000.png", "a_segment_001_frame_001.png"]
        );
    }
}
