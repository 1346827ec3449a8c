//! Input directory scanning and eligibility.
//!
//! [`scan_dir`] lists what is in the input directory; [`EligibilityFilter`]
//! decides which of those files should be segmented on this poll.

pub mod settle;

pub use settle::StabilityTracker;

use crate::state::{InputFile, ProcessedSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Extensions accepted when no list is configured.
const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// A file or directory that could not be classified on this poll.
///
/// Never fatal: the entry is skipped and looked at again on the next poll.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("cannot list {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read metadata of {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Regular files found directly inside the input directory.
#[derive(Debug, Default)]
pub struct DirListing {
    pub files: Vec<InputFile>,
    /// Entries skipped for this poll.
    pub errors: Vec<EligibilityError>,
}

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. Entries whose metadata cannot be
/// read are reported in [`DirListing::errors`].
pub fn scan_dir(dir: &Path) -> Result<DirListing, EligibilityError> {
    let mut listing = DirListing::default();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                let at_root = e.depth() == 0 || path.as_deref() == Some(dir);
                let path = path.unwrap_or_else(|| dir.to_path_buf());
                let source = std::io::Error::from(e);
                if at_root {
                    return Err(EligibilityError::Listing { path, source });
                }
                listing.errors.push(EligibilityError::Metadata { path, source });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        match entry
            .metadata()
            .map_err(std::io::Error::from)
            .and_then(|m| InputFile::from_metadata(path.clone(), &m))
        {
            Ok(file) => listing.files.push(file),
            Err(source) => listing
                .errors
                .push(EligibilityError::Metadata { path, source }),
        }
    }

    Ok(listing)
}

/// Decides which files are new, are videos, and are done being written.
#[derive(Debug, Clone)]
pub struct EligibilityFilter {
    extensions: Vec<String>,
    stability: StabilityTracker,
}

impl EligibilityFilter {
    /// `extensions` empty means the built-in video list.
    pub fn new(extensions: &[String], settle_time: Duration) -> Self {
        let extensions = if extensions.is_empty() {
            DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect()
        } else {
            extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect()
        };

        Self {
            extensions,
            stability: StabilityTracker::new(settle_time),
        }
    }

    /// Check if a path has an allowed video extension (case-insensitive).
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    fn is_hidden(file: &InputFile) -> bool {
        file.name.starts_with('.')
    }

    /// Unprocessed, visible video files: everything that is waiting on the
    /// stability check alone.
    fn candidates<'s, 'c: 's>(
        &'s self,
        contents: &'c [InputFile],
        processed: &'c ProcessedSet,
    ) -> impl Iterator<Item = &'c InputFile> + 's {
        contents
            .iter()
            .filter(move |f| !processed.is_processed(&f.path))
            .filter(|f| !Self::is_hidden(f))
            .filter(move |f| self.is_video_file(&f.path))
    }

    /// Files from `contents` that should be segmented now, ordered by name.
    ///
    /// Does not change the filter: calling it again with the same inputs
    /// yields the same result. Call [`EligibilityFilter::observe`] once per
    /// poll afterwards.
    pub fn select(
        &self,
        contents: &[InputFile],
        processed: &ProcessedSet,
        now: SystemTime,
    ) -> Vec<InputFile> {
        let mut eligible: Vec<InputFile> = self
            .candidates(contents, processed)
            .filter(|f| self.stability.is_settled(f, now))
            .cloned()
            .collect();

        eligible.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        eligible
    }

    /// Candidates held back because they may still be written to.
    pub fn waiting(
        &self,
        contents: &[InputFile],
        processed: &ProcessedSet,
        now: SystemTime,
    ) -> Vec<PathBuf> {
        self.candidates(contents, processed)
            .filter(|f| !self.stability.is_settled(f, now))
            .map(|f| f.path.clone())
            .collect()
    }

    /// Remember this poll's unprocessed candidates for the next stability check.
    pub fn observe(&mut self, contents: &[InputFile], processed: &ProcessedSet) {
        let seen: Vec<&InputFile> = self.candidates(contents, processed).collect();
        self.stability.observe(seen);
    }

    /// Drop stability state for a file, e.g. once it has been processed.
    pub fn forget(&mut self, path: &Path) {
        self.stability.forget(path);
    }
}
