//! Staging directory for segment output.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Staging area for one segmentation run.
///
/// The staging directory is created inside the destination directory so the
/// final moves are same-filesystem renames. If the workspace is dropped
/// without [`Workspace::commit`], everything staged is removed, so a failed
/// run leaves no partial segments behind.
///
/// # Example
///
/// ```no_run
/// use segwatch_av::Workspace;
///
/// let workspace = Workspace::new("/path/to/AfterSplit")?;
/// // ffmpeg writes into workspace.staging_dir()
/// let committed = workspace.commit()?;
/// # Ok::<(), segwatch_av::Error>(())
/// ```
#[derive(Debug)]
pub struct Workspace {
    staging: TempDir,
    destination: PathBuf,
}

impl Workspace {
    /// Create a staging directory under `destination`.
    pub fn new<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        if !destination.is_dir() {
            return Err(Error::Workspace(format!(
                "destination is not a directory: {}",
                destination.display()
            )));
        }

        let staging = tempfile::Builder::new()
            .prefix(".segwatch-staging-")
            .tempdir_in(&destination)
            .map_err(|e| Error::Workspace(format!("failed to create staging dir: {e}")))?;

        Ok(Self {
            staging,
            destination,
        })
    }

    /// Directory the tool writes into.
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    /// Staged regular files, sorted by file name.
    pub fn staged_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(self.staging.path())? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Where a staged file will land after commit.
    pub fn destination_for(&self, staged: &Path) -> Result<PathBuf> {
        let name = staged
            .file_name()
            .ok_or_else(|| Error::InvalidInput(format!("no file name: {}", staged.display())))?;
        Ok(self.destination.join(name))
    }

    /// Move every staged file into the destination and remove the staging
    /// directory.
    ///
    /// Existing files are never replaced: if any destination is taken,
    /// nothing is moved. Returns the committed paths in file-name order. If a
    /// move fails, files already moved stay in place and the rest are
    /// discarded with the staging directory.
    pub fn commit(self) -> Result<Vec<PathBuf>> {
        let staged = self.staged_files()?;
        let mut moves = Vec::with_capacity(staged.len());
        for file in staged {
            let dest = self.destination_for(&file)?;
            if dest.exists() {
                return Err(Error::Workspace(format!(
                    "refusing to overwrite {}",
                    dest.display()
                )));
            }
            moves.push((file, dest));
        }

        let mut committed = Vec::with_capacity(moves.len());
        for (file, dest) in moves {
            std::fs::rename(&file, &dest).map_err(|e| {
                Error::Workspace(format!(
                    "failed to move {} to {}: {e}",
                    file.display(),
                    dest.display()
                ))
            })?;
            committed.push(dest);
        }

        Ok(committed)
    }

    /// Discard everything staged.
    pub fn cleanup(self) {
        drop(self.staging);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_lives_inside_destination() {
        let out = tempfile::tempdir().unwrap();
        let ws = Workspace::new(out.path()).unwrap();
        assert!(ws.staging_dir().starts_with(out.path()));
        assert_eq!(
            ws.destination_for(Path::new("x/a_segment_001.mp4")).unwrap(),
            out.path().join("a_segment_001.mp4")
        );
    }

    #[test]
    fn commit_moves_files_in_name_order() {
        let out = tempfile::tempdir().unwrap();
        let ws = Workspace::new(out.path()).unwrap();
        std::fs::write(ws.staging_dir().join("a_segment_002.mp4"), b"2").unwrap();
        std::fs::write(ws.staging_dir().join("a_segment_001.mp4"), b"1").unwrap();
        let staging = ws.staging_dir().to_path_buf();

        let committed = ws.commit().unwrap();
        assert_eq!(
            committed,
            vec![
                out.path().join("a_segment_001.mp4"),
                out.path().join("a_segment_002.mp4"),
            ]
        );
        assert!(!staging.exists());
    }

    #[test]
    fn commit_never_replaces_existing_output() {
        let out = tempfile::tempdir().unwrap();
        std::fs::write(out.path().join("a_segment_002.mp4"), b"earlier").unwrap();

        let ws = Workspace::new(out.path()).unwrap();
        std::fs::write(ws.staging_dir().join("a_segment_001.mp4"), b"1").unwrap();
        std::fs::write(ws.staging_dir().join("a_segment_002.mp4"), b"2").unwrap();

        let err = ws.commit().unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"), "{err}");
        assert!(!out.path().join("a_segment_001.mp4").exists());
        assert_eq!(
            std::fs::read(out.path().join("a_segment_002.mp4")).unwrap(),
            b"earlier"
        );
    }

    #[test]
    fn dropping_discards_staged_output() {
        let out = tempfile::tempdir().unwrap();
        let ws = Workspace::new(out.path()).unwrap();
        std::fs::write(ws.staging_dir().join("partial.mp4"), b"x").unwrap();
        let staging = ws.staging_dir().to_path_buf();

        ws.cleanup();
        assert!(!staging.exists());
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn destination_must_exist() {
        let result = Workspace::new("/nonexistent/segwatch/out");
        assert!(matches!(result, Err(Error::Workspace(_))));
    }
}
