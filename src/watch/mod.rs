//! The poll loop: scan, segment what is eligible, record, report, sleep.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;

use crate::config::{SegmentDuration, Settings};
use crate::scanner::{scan_dir, EligibilityFilter};
use crate::segmenter::Segmenter;
use crate::state::{BatchReport, FileFailure, ProcessedSet, RunSummary};

/// How the loop terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One batch, then exit.
    SinglePass,
    /// Poll forever at `interval` until interrupted.
    Watch { interval: Duration },
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    ProcessingBatch,
    Sleeping,
    Done,
}

/// Fixed inputs of a run.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub duration: SegmentDuration,
    pub mode: Mode,
}

impl LoopConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let mode = if settings.watch {
            Mode::Watch {
                interval: settings.interval,
            }
        } else {
            Mode::SinglePass
        };

        Self {
            input_dir: settings.input_dir.clone(),
            output_dir: settings.output_dir.clone(),
            duration: settings.duration,
            mode,
        }
    }
}

/// Everything the loop carries from one poll to the next.
#[derive(Debug, Clone)]
pub struct LoopState {
    pub phase: Phase,
    pub processed: ProcessedSet,
    pub filter: EligibilityFilter,
    /// Completed poll cycles.
    pub cycles: u64,
}

impl LoopState {
    pub fn new(filter: EligibilityFilter) -> Self {
        Self {
            phase: Phase::Idle,
            processed: ProcessedSet::new(),
            filter,
            cycles: 0,
        }
    }
}

/// Run one poll cycle against `state`.
///
/// Files are segmented one after another. A failed file is reported and
/// left unmarked so the next poll retries it; it never stops the batch. The
/// interrupt is checked between files: an invocation already running is
/// allowed to finish, the rest of the batch is left for later.
pub async fn run_cycle<S>(
    state: &mut LoopState,
    config: &LoopConfig,
    segmenter: &S,
    cancel: &CancellationToken,
) -> BatchReport
where
    S: Segmenter + ?Sized,
{
    state.cycles += 1;
    let mut report = BatchReport {
        cycle: state.cycles,
        ..Default::default()
    };

    state.phase = Phase::Scanning;
    let listing = match scan_dir(&config.input_dir) {
        Ok(listing) => listing,
        Err(e) => {
            report.scan_error = Some(e.to_string());
            report.log();
            return report;
        }
    };

    for err in &listing.errors {
        tracing::warn!("Skipping for now, will retry next poll: {}", err);
    }
    report.deferred = listing.errors.len();

    let now = SystemTime::now();
    let eligible = state.filter.select(&listing.files, &state.processed, now);
    report.waiting = state.filter.waiting(&listing.files, &state.processed, now);
    state.filter.observe(&listing.files, &state.processed);
    report.eligible = eligible.len();

    state.phase = Phase::ProcessingBatch;
    for (i, file) in eligible.iter().enumerate() {
        if cancel.is_cancelled() {
            report.interrupted = true;
            break;
        }

        tracing::info!(
            "Processing {} ({}/{})",
            file.path.display(),
            i + 1,
            eligible.len()
        );

        match segmenter
            .segment(file, config.duration, &config.output_dir)
            .await
        {
            Ok(artifacts) => {
                state.processed.mark_processed(file);
                state.filter.forget(&file.path);
                tracing::info!(
                    "Split {} into {} segments",
                    file.path.display(),
                    artifacts.len()
                );
                report.processed += 1;
                report.segments += artifacts.len();
            }
            Err(e) => {
                tracing::error!(file = %e.path.display(), "{}", e);
                report.failures.push(FileFailure {
                    path: e.path,
                    cause: e.cause,
                });
            }
        }
    }

    report.log();
    report
}

/// Top-level scheduler owning the loop state.
pub struct WatchLoop<S> {
    config: LoopConfig,
    segmenter: S,
    state: LoopState,
}

impl<S: Segmenter> WatchLoop<S> {
    pub fn new(config: LoopConfig, filter: EligibilityFilter, segmenter: S) -> Self {
        Self {
            config,
            segmenter,
            state: LoopState::new(filter),
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    /// Run a single cycle without sleeping.
    pub async fn cycle(&mut self, cancel: &CancellationToken) -> BatchReport {
        let report = run_cycle(&mut self.state, &self.config, &self.segmenter, cancel).await;
        self.state.phase = Phase::Idle;
        report
    }

    /// Run until the mode says stop: after one batch in single-pass mode, or
    /// when `cancel` fires in watch mode.
    pub async fn run(&mut self, cancel: CancellationToken) -> RunSummary {
        let mut summary = RunSummary::default();

        match self.config.mode {
            Mode::SinglePass => {
                tracing::info!("Processing {:?}", self.config.input_dir);
            }
            Mode::Watch { interval } => {
                tracing::info!(
                    "Watching {:?} for new videos every {}s...",
                    self.config.input_dir,
                    interval.as_secs()
                );
            }
        }

        loop {
            let report = run_cycle(&mut self.state, &self.config, &self.segmenter, &cancel).await;
            summary.absorb(&report);

            let interval = match self.config.mode {
                Mode::SinglePass => break,
                Mode::Watch { interval } => interval,
            };
            tracing::debug!(
                "{} video(s) processed so far",
                self.state.processed.len()
            );
            if cancel.is_cancelled() {
                tracing::info!("Watch mode stopped.");
                break;
            }

            self.state.phase = Phase::Sleeping;
            tracing::debug!("Waiting {}s before next check...", interval.as_secs_f64());
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = cancel.cancelled() => {
                    tracing::info!("Watch mode stopped.");
                    break;
                }
            }
        }

        self.state.phase = Phase::Done;
        summary
    }
}
