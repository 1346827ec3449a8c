use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::state::InputFile;

/// What a file looked like on a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub size: u64,
    pub modified: SystemTime,
}

impl From<&InputFile> for Observation {
    fn from(file: &InputFile) -> Self {
        Self {
            size: file.size,
            modified: file.modified,
        }
    }
}

/// Tracks files between polls and decides when they've "settled"
/// (stopped changing).
///
/// The map is transient: it only holds files seen on the most recent poll
/// that were not yet processed.
#[derive(Debug, Clone)]
pub struct StabilityTracker {
    /// Map of file path to what the previous poll saw
    last_seen: HashMap<PathBuf, Observation>,
    /// How long a file must be unchanged to be considered settled
    settle_time: Duration,
}

impl StabilityTracker {
    pub fn new(settle_time: Duration) -> Self {
        Self {
            last_seen: HashMap::new(),
            settle_time,
        }
    }

    /// A file is settled when it is non-empty and either has not been
    /// modified for `settle_time`, or looked identical on the previous poll.
    pub fn is_settled(&self, file: &InputFile, now: SystemTime) -> bool {
        if file.size == 0 {
            return false;
        }

        // A modification time in the future counts as "just written".
        let age = now.duration_since(file.modified).unwrap_or(Duration::ZERO);
        if age >= self.settle_time {
            return true;
        }

        self.last_seen.get(&file.path) == Some(&Observation::from(file))
    }

    /// Replace the remembered observations with this poll's.
    ///
    /// Files absent from `files` are dropped, so a deleted file does not
    /// linger in the map.
    pub fn observe<'a>(&mut self, files: impl IntoIterator<Item = &'a InputFile>) {
        self.last_seen = files
            .into_iter()
            .map(|f| (f.path.clone(), Observation::from(f)))
            .collect();
    }

    /// Remove a file from tracking (e.g., once processed)
    pub fn forget(&mut self, path: &Path) {
        self.last_seen.remove(path);
    }

    pub fn tracked(&self) -> usize {
        self.last_seen.len()
    }
}
