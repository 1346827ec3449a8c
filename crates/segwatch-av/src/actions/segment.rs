//! Fixed-duration segmentation using the ffmpeg segment muxer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{ToolCommand, DEFAULT_TIMEOUT};
use crate::probe::probe_duration;
use crate::tools::ToolPaths;
use crate::workspace::Workspace;
use crate::{Error, Result};

/// A segment may run past its target by up to this much (container and
/// audio frame granularity).
pub const SEGMENT_TOLERANCE: Duration = Duration::from_millis(250);

/// Allowed difference between the source duration and the summed segments.
pub const COVERAGE_TOLERANCE: Duration = Duration::from_millis(500);

/// Options for one segmentation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Target length of each segment.
    pub segment_length: Duration,
    /// ffmpeg video encoder.
    pub video_codec: String,
    /// ffmpeg audio encoder.
    pub audio_codec: String,
    /// Output container extension, e.g. `mp4`.
    pub container: String,
    /// Upper bound on a single ffmpeg run.
    pub timeout: Duration,
}

impl SegmentOptions {
    /// Options with the default codecs (libx264/aac in mp4).
    pub fn new(segment_length: Duration) -> Self {
        Self {
            segment_length,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            container: "mp4".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Planned `[start, end)` window of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentSpan {
    /// 1-based position in the sequence.
    pub index: u32,
    pub start: Duration,
    pub end: Duration,
}

impl SegmentSpan {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A segment written to the destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedSegment {
    pub path: PathBuf,
    /// 1-based position in the sequence.
    pub index: u32,
    /// Offset of the segment within the source.
    pub start: Duration,
    /// Measured duration.
    pub duration: Duration,
}

/// Split `total` into consecutive windows of `length`; the last window may be
/// shorter. A zero `total` yields no windows.
pub fn segment_plan(total: Duration, length: Duration) -> Vec<SegmentSpan> {
    let mut spans = Vec::new();
    if length.is_zero() {
        return spans;
    }

    let mut start = Duration::ZERO;
    let mut index = 1;
    while start < total {
        let end = (start + length).min(total);
        spans.push(SegmentSpan { index, start, end });
        start = end;
        index += 1;
    }
    spans
}

/// ffmpeg muxer name for a container extension.
pub fn muxer_for(container: &str) -> Result<&'static str> {
    match container.to_lowercase().as_str() {
        "mp4" | "m4v" => Ok("mp4"),
        "mkv" => Ok("matroska"),
        "mov" => Ok("mov"),
        "ts" => Ok("mpegts"),
        "webm" => Ok("webm"),
        other => Err(Error::InvalidInput(format!(
            "unsupported segment container: {other}"
        ))),
    }
}

/// File name of the `index`-th segment of `stem`.
pub fn segment_file_name(stem: &str, index: u32, container: &str) -> String {
    format!("{stem}_segment_{index:03}.{container}")
}

/// Recover the segment index from a file name produced for `stem`.
pub fn parse_segment_index(file_name: &str, stem: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(stem)?.strip_prefix("_segment_")?;
    let (digits, _ext) = rest.split_once('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn file_stem(input: &Path) -> Result<String> {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| Error::InvalidInput(format!("invalid input path: {}", input.display())))
}

/// Stem for the segments of `input` that no earlier source has claimed in
/// `output_dir`.
///
/// `clip.mp4` and `clip.mkv` would both produce `clip_segment_001.*`; the
/// later one gets its source extension appended (`clip_mkv_segment_001.*`),
/// then a counter if even that is taken.
pub fn output_stem(input: &Path, output_dir: &Path, container: &str) -> Result<String> {
    let stem = file_stem(input)?;
    let taken = |candidate: &str| {
        output_dir
            .join(segment_file_name(candidate, 1, container))
            .exists()
    };
    if !taken(&stem) {
        return Ok(stem);
    }

    let base = match input.extension() {
        Some(ext) => format!("{stem}_{}", ext.to_string_lossy().to_lowercase()),
        None => stem,
    };
    if !taken(&base) {
        return Ok(base);
    }

    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Build the ffmpeg invocation that writes all segments into `staging_dir`.
///
/// Segments are named after `stem`, see [`output_stem`].
pub fn build_segment_command(
    ffmpeg: &Path,
    input: &Path,
    stem: &str,
    staging_dir: &Path,
    opts: &SegmentOptions,
) -> Result<ToolCommand> {
    let muxer = muxer_for(&opts.container)?;
    let secs = opts.segment_length.as_secs_f64();

    // The segment muxer treats '%' in the pattern as a format directive.
    let pattern_name = format!(
        "{}_segment_%03d.{}",
        stem.replace('%', "%%"),
        opts.container
    );
    let pattern = staging_dir.join(pattern_name);

    let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
    cmd.timeout(opts.timeout).own_process_group();
    cmd.args(["-hide_banner", "-nostdin", "-y", "-v", "error", "-i"]);
    cmd.arg(input.to_string_lossy());
    cmd.args(["-map", "0:v:0", "-map", "0:a?"]);
    cmd.args(["-c:v", &opts.video_codec, "-c:a", &opts.audio_codec]);
    // Key frames on every boundary so cuts land exactly on the target.
    cmd.args(["-force_key_frames", &format!("expr:gte(t,n_forced*{secs})")]);
    cmd.args(["-f", "segment", "-segment_time", &secs.to_string()]);
    cmd.args(["-segment_format", muxer]);
    cmd.args(["-segment_start_number", "1", "-reset_timestamps", "1"]);
    cmd.arg(pattern.to_string_lossy());
    Ok(cmd)
}

/// Check measured segment durations against the source and the target.
pub fn verify_segments(source: Duration, durations: &[Duration], length: Duration) -> Result<()> {
    if durations.is_empty() {
        return Err(Error::Verification("no segments produced".to_string()));
    }

    for (i, d) in durations.iter().enumerate() {
        if *d > length + SEGMENT_TOLERANCE {
            return Err(Error::Verification(format!(
                "segment {} is {:.3}s, longer than {:.3}s",
                i + 1,
                d.as_secs_f64(),
                length.as_secs_f64()
            )));
        }
    }

    let total: Duration = durations.iter().sum();
    let diff = if total > source {
        total - source
    } else {
        source - total
    };
    if diff > COVERAGE_TOLERANCE {
        return Err(Error::Verification(format!(
            "segments cover {:.3}s of a {:.3}s source",
            total.as_secs_f64(),
            source.as_secs_f64()
        )));
    }

    Ok(())
}

/// Split `input` into segments of `opts.segment_length` inside `output_dir`.
///
/// Runs ffmpeg exactly once. Output is staged and only moved into
/// `output_dir` after every segment has been measured and verified; on any
/// failure the staged output is discarded.
pub async fn split_into_segments(
    tools: &ToolPaths,
    input: &Path,
    output_dir: &Path,
    opts: &SegmentOptions,
) -> Result<Vec<ProducedSegment>> {
    let source_duration = probe_duration(&tools.ffprobe, input).await?;
    let stem = output_stem(input, output_dir, &opts.container)?;
    let workspace = Workspace::new(output_dir)?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Segmenting {:?} ({:.1}s) into {}s segments",
        input,
        source_duration.as_secs_f64(),
        opts.segment_length.as_secs()
    );

    build_segment_command(&tools.ffmpeg, input, &stem, workspace.staging_dir(), opts)?
        .execute()
        .await?;

    let mut staged: Vec<(u32, PathBuf)> = workspace
        .staged_files()?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            parse_segment_index(&name, &stem).map(|index| (index, path))
        })
        .collect();
    staged.sort_by_key(|(index, _)| *index);

    let mut durations = Vec::with_capacity(staged.len());
    for (_, path) in &staged {
        durations.push(probe_duration(&tools.ffprobe, path).await?);
    }

    verify_segments(source_duration, &durations, opts.segment_length)?;

    let mut produced = Vec::with_capacity(staged.len());
    let mut start = Duration::ZERO;
    for ((index, path), duration) in staged.iter().zip(&durations) {
        produced.push(ProducedSegment {
            path: workspace.destination_for(path)?,
            index: *index,
            start,
            duration: *duration,
        });
        start += *duration;
    }

    workspace.commit()?;

    #[cfg(feature = "tracing")]
    tracing::info!("Wrote {} segments for {:?}", produced.len(), input);

    Ok(produced)
}
