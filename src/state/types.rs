use std::fs::Metadata;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// A candidate source video found in the input directory.
///
/// Identified by its path; the pipeline never modifies the file itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

impl InputFile {
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path,
            name,
            size,
            modified,
        }
    }

    /// Build from filesystem metadata.
    pub fn from_metadata(path: PathBuf, metadata: &Metadata) -> std::io::Result<Self> {
        Ok(Self::new(path, metadata.len(), metadata.modified()?))
    }
}

/// One output clip produced from an [`InputFile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentArtifact {
    pub path: PathBuf,
    /// 1-based position within the source's sequence.
    pub index: u32,
    /// Path of the owning input file.
    pub source: PathBuf,
    pub start: Duration,
    pub duration: Duration,
}

/// A file that could not be segmented during a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub cause: String,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Poll cycle number, starting at 1.
    pub cycle: u64,
    /// Files selected as eligible this cycle.
    pub eligible: usize,
    /// Files segmented and recorded as processed.
    pub processed: usize,
    /// Segments written across all processed files.
    pub segments: usize,
    pub failures: Vec<FileFailure>,
    /// Files skipped because they could not be classified this cycle.
    pub deferred: usize,
    /// Videos held back because they may still be written to.
    pub waiting: Vec<PathBuf>,
    /// Why the input directory could not be listed, if it could not.
    pub scan_error: Option<String>,
    /// Set when an interrupt cut the batch short.
    pub interrupted: bool,
}

impl BatchReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Eligible files left untouched because of an interrupt.
    pub fn skipped(&self) -> usize {
        self.eligible
            .saturating_sub(self.processed + self.failed())
    }

    /// Nothing was found, attempted, or held back.
    pub fn is_idle(&self) -> bool {
        self.eligible == 0
            && self.deferred == 0
            && self.waiting.is_empty()
            && self.scan_error.is_none()
    }

    /// Emit the end-of-batch summary.
    pub fn log(&self) {
        if let Some(err) = &self.scan_error {
            tracing::warn!("Poll {}: could not scan input directory: {}", self.cycle, err);
            return;
        }

        if self.is_idle() {
            tracing::info!("Poll {}: no new videos", self.cycle);
            return;
        }

        tracing::info!(
            cycle = self.cycle,
            processed = self.processed,
            failed = self.failed(),
            segments = self.segments,
            deferred = self.deferred,
            waiting = self.waiting.len(),
            "Poll {} finished: {} processed, {} failed, {} still being written",
            self.cycle,
            self.processed,
            self.failed(),
            self.waiting.len()
        );

        for failure in &self.failures {
            tracing::warn!("  failed: {}: {}", failure.path.display(), failure.cause);
        }

        for path in &self.waiting {
            tracing::info!("  waiting: {} is still being written", path.display());
        }

        if self.interrupted {
            tracing::info!(
                "Poll {} interrupted; {} file(s) left for a later run",
                self.cycle,
                self.skipped()
            );
        }
    }
}

/// Totals across every poll of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub processed: usize,
    pub failed_attempts: usize,
    pub segments: usize,
}

impl RunSummary {
    pub fn absorb(&mut self, report: &BatchReport) {
        self.cycles += 1;
        self.processed += report.processed;
        self.failed_attempts += report.failed();
        self.segments += report.segments;
    }
}
