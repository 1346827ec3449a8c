//! Shared test infrastructure for segwatch integration tests.
//!
//! Provides [`TestHarness`], which owns a temporary input/output directory
//! pair, and [`PlanSegmenter`], a stand-in for ffmpeg that writes one file
//! per planned segment.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use segwatch::config::SegmentDuration;
use segwatch::scanner::EligibilityFilter;
use segwatch::segmenter::{SegmentationError, Segmenter};
use segwatch::state::{InputFile, SegmentArtifact};
use segwatch::watch::{LoopConfig, Mode, WatchLoop};
use segwatch_av::actions::{segment_file_name, segment_plan};
use tempfile::TempDir;

pub struct TestHarness {
    pub root: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("failed to create temp dir");
        let input = root.path().join("BeforeSplit");
        let output = root.path().join("AfterSplit");
        std::fs::create_dir(&input).unwrap();
        std::fs::create_dir(&output).unwrap();
        Self {
            root,
            input,
            output,
        }
    }

    /// Drop a (fake) video into the input directory.
    pub fn add_video(&self, name: &str) -> PathBuf {
        let path = self.input.join(name);
        std::fs::write(&path, b"not a real video, the segmenter is scripted").unwrap();
        path
    }

    pub fn loop_config(&self, duration: u32, mode: Mode) -> LoopConfig {
        LoopConfig {
            input_dir: self.input.clone(),
            output_dir: self.output.clone(),
            duration: SegmentDuration::new(i64::from(duration)).unwrap(),
            mode,
        }
    }

    /// A loop whose filter treats every non-empty file as fully written.
    pub fn watch_loop(
        &self,
        duration: u32,
        mode: Mode,
        segmenter: PlanSegmenter,
    ) -> WatchLoop<PlanSegmenter> {
        self.settling_loop(duration, mode, segmenter, Duration::ZERO)
    }

    /// A loop that holds back files modified within `settle_time`.
    pub fn settling_loop(
        &self,
        duration: u32,
        mode: Mode,
        segmenter: PlanSegmenter,
        settle_time: Duration,
    ) -> WatchLoop<PlanSegmenter> {
        WatchLoop::new(
            self.loop_config(duration, mode),
            EligibilityFilter::new(&[], settle_time),
            segmenter,
        )
    }

    pub fn output_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.output)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

/// Pretends to be ffmpeg: each source has a scripted length and every
/// planned segment becomes a small file in the output directory.
#[derive(Default)]
pub struct PlanSegmenter {
    lengths: HashMap<String, Duration>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl PlanSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_length(mut self, name: &str, secs: u64) -> Self {
        self.lengths
            .insert(name.to_string(), Duration::from_secs(secs));
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Segmenter for PlanSegmenter {
    async fn segment(
        &self,
        file: &InputFile,
        duration: SegmentDuration,
        output_dir: &Path,
    ) -> Result<Vec<SegmentArtifact>, SegmentationError> {
        self.calls.lock().unwrap().push(file.name.clone());

        if self.failing.contains(&file.name) {
            return Err(SegmentationError::new(
                &file.path,
                "Invalid data found when processing input",
            ));
        }

        let total = self
            .lengths
            .get(&file.name)
            .copied()
            .unwrap_or(Duration::from_secs(10));
        let stem = file.path.file_stem().unwrap().to_string_lossy().to_string();

        let mut artifacts = Vec::new();
        for span in segment_plan(total, duration.as_duration()) {
            let path = output_dir.join(segment_file_name(&stem, span.index, "mp4"));
            std::fs::write(&path, b"segment")
                .map_err(|e| SegmentationError::new(&file.path, e.to_string()))?;
            artifacts.push(SegmentArtifact {
                path,
                index: span.index,
                source: file.path.clone(),
                start: span.start,
                duration: span.duration(),
            });
        }
        Ok(artifacts)
    }
}
