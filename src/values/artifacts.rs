//! Artifact store: owned storage for encoded binary outputs.
//!
//! Every image or tensor produced by a prediction is written here and handed
//! to the host by path. A temporary store removes its directory when dropped;
//! a store over a configured directory leaves files in place.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::types::{ArtifactConfig, Error, Result};

#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    // Held for its Drop; `None` when files are retained.
    scratch: Option<TempDir>,
}

impl ArtifactStore {
    /// Store backed by a fresh temporary directory, removed on drop.
    pub fn temporary() -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix("predictor-mcp-")
            .tempdir()?;
        Ok(Self {
            root: scratch.path().to_path_buf(),
            scratch: Some(scratch),
        })
    }

    /// Store that writes into `dir` and never deletes what it writes.
    pub fn retained(dir: impl Into<PathBuf>) -> Result<Self> {
        let root = dir.into();
        std::fs::create_dir_all(&root).map_err(|e| Error::from_io_at(e, &root))?;
        Ok(Self {
            root,
            scratch: None,
        })
    }

    pub fn from_config(config: &ArtifactConfig) -> Result<Self> {
        match &config.output_dir {
            Some(dir) => Self::retained(dir.clone()),
            None => Self::temporary(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_retained(&self) -> bool {
        self.scratch.is_none()
    }

    /// Write `bytes` to a new uniquely named file ending in `suffix`.
    ///
    /// The file is flushed and synced before its path is returned.
    pub fn write(&self, suffix: &str, bytes: &[u8]) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("prediction-")
            .suffix(suffix)
            .tempfile_in(&self.root)
            .map_err(|e| Error::from_io_at(e, &self.root))?;
        file.write_all(bytes)?;
        file.flush()?;
        file.as_file().sync_all()?;
        let (_, path) = file.keep().map_err(|e| Error::Io(e.error))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote artifact");
        Ok(path)
    }
}
