use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    types::Tag,
};

const FILE_STEM: &str = "fragment";

/// Private temporary directory holding one fragment's source file and build
/// artifact.
///
/// The directory is removed when the workspace is closed or dropped, so every
/// exit path of a fragment run (success, failure, timeout, panic or a dropped
/// future) releases it.
#[derive(Debug)]
pub struct ArtifactWorkspace {
    dir: TempDir,
}

impl ArtifactWorkspace {
    pub fn create(scratch_dir: &Path, tag: Tag) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("m5r-{tag}-"))
            .tempdir_in(scratch_dir)
            .map_err(|source| Error::WorkspaceError {
                path: scratch_dir.to_path_buf(),
                source,
            })?;
        debug!("Created workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the program text to `fragment.<extension>` and return its path.
    pub async fn write_source(&self, extension: &str, text: &str) -> Result<PathBuf> {
        let path = self.file_path(Some(extension));
        tokio::fs::write(&path, text)
            .await
            .map_err(|source| Error::WorkspaceError {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Where a compiler is asked to put its output.
    pub fn artifact_path(&self, extension: Option<&str>) -> PathBuf {
        self.file_path(extension)
    }

    fn file_path(&self, extension: Option<&str>) -> PathBuf {
        match extension.filter(|ext| !ext.is_empty()) {
            Some(ext) => self.dir.path().join(format!("{FILE_STEM}.{ext}")),
            None => self.dir.path().join(FILE_STEM),
        }
    }

    /// Remove the directory now. Failures are logged and otherwise ignored.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            warn!("Failed to clean up {}: {}", path.display(), e);
        }
    }
}
