//! The seam between the watch loop and the external segmentation tool.

use async_trait::async_trait;
use segwatch_av::actions::{extract_frames, split_into_segments, SegmentOptions};
use segwatch_av::ToolPaths;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::{SegmentDuration, Settings};
use crate::state::{InputFile, SegmentArtifact};

/// Segmentation of one file failed; nothing was claimed as written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to segment {}: {cause}", path.display())]
pub struct SegmentationError {
    pub path: PathBuf,
    pub cause: String,
}

impl SegmentationError {
    pub fn new(path: impl Into<PathBuf>, cause: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cause: cause.into(),
        }
    }
}

/// Splits one input file into segments.
///
/// Each call invokes the underlying tool once and never retries; retrying is
/// left to the next poll.
#[async_trait]
pub trait Segmenter: Send + Sync {
    async fn segment(
        &self,
        file: &InputFile,
        duration: SegmentDuration,
        output_dir: &Path,
    ) -> Result<Vec<SegmentArtifact>, SegmentationError>;
}

/// [`Segmenter`] backed by ffmpeg, optionally extracting stills per second.
#[derive(Debug, Clone)]
pub struct FfmpegSegmenter {
    tools: ToolPaths,
    video_codec: String,
    audio_codec: String,
    container: String,
    timeout: Duration,
    frame_dir: Option<PathBuf>,
}

impl FfmpegSegmenter {
    pub fn new(tools: ToolPaths) -> Self {
        let defaults = SegmentOptions::new(Duration::ZERO);
        Self {
            tools,
            video_codec: defaults.video_codec,
            audio_codec: defaults.audio_codec,
            container: defaults.container,
            timeout: defaults.timeout,
            frame_dir: None,
        }
    }

    /// Build from resolved settings.
    pub fn from_settings(tools: ToolPaths, settings: &Settings) -> Self {
        Self {
            tools,
            video_codec: settings.segment.video_codec.clone(),
            audio_codec: settings.segment.audio_codec.clone(),
            container: settings.segment.container.clone(),
            timeout: Duration::from_secs(settings.tools.timeout_secs),
            frame_dir: settings.frame_dir.clone(),
        }
    }

    pub fn with_frame_dir(mut self, frame_dir: impl Into<PathBuf>) -> Self {
        self.frame_dir = Some(frame_dir.into());
        self
    }

    fn options(&self, duration: SegmentDuration) -> SegmentOptions {
        SegmentOptions {
            segment_length: duration.as_duration(),
            video_codec: self.video_codec.clone(),
            audio_codec: self.audio_codec.clone(),
            container: self.container.clone(),
            timeout: self.timeout,
        }
    }

    /// Stills are a by-product: a failure here is logged, not propagated,
    /// since the segments are already committed.
    async fn extract_stills(&self, frame_dir: &Path, artifacts: &[SegmentArtifact]) {
        for artifact in artifacts {
            match extract_frames(&self.tools.ffmpeg, &artifact.path, frame_dir).await {
                Ok(frames) => {
                    tracing::debug!(
                        "Saved {} frames for {}",
                        frames.len(),
                        artifact.path.display()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Frame extraction failed for {}: {}",
                        artifact.path.display(),
                        e
                    );
                }
            }
        }
    }
}

#[async_trait]
impl Segmenter for FfmpegSegmenter {
    async fn segment(
        &self,
        file: &InputFile,
        duration: SegmentDuration,
        output_dir: &Path,
    ) -> Result<Vec<SegmentArtifact>, SegmentationError> {
        let opts = self.options(duration);
        let produced = split_into_segments(&self.tools, &file.path, output_dir, &opts)
            .await
            .map_err(|e| SegmentationError::new(&file.path, e.to_string()))?;

        let artifacts: Vec<SegmentArtifact> = produced
            .into_iter()
            .map(|seg| SegmentArtifact {
                path: seg.path,
                index: seg.index,
                source: file.path.clone(),
                start: seg.start,
                duration: seg.duration,
            })
            .collect();

        for artifact in &artifacts {
            tracing::debug!(
                "Segment {} ({:.2}s at {:.2}s): {}",
                artifact.index,
                artifact.duration.as_secs_f64(),
                artifact.start.as_secs_f64(),
                artifact.path.display()
            );
        }

        if let Some(frame_dir) = &self.frame_dir {
            self.extract_stills(frame_dir, &artifacts).await;
        }

        Ok(artifacts)
    }
}
