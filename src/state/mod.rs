mod types;

pub use types::*;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Input files already handled during this run.
///
/// In memory only; grows for the lifetime of the process and is never
/// pruned.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    paths: HashSet<PathBuf>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file as processed. Returns `false` if it already was.
    pub fn mark_processed(&mut self, file: &InputFile) -> bool {
        self.paths.insert(file.path.clone())
    }

    pub fn is_processed(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
