//! File-based progress storage for keyflow.
//!
//! Progress is stored as a single JSON document, by default at
//! `~/.keyflow/progress.json`. Atomic writes are achieved via the temp file
//! + rename pattern.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::progress_path;
use crate::engine::Progress;
use crate::error::{KeyflowError, Result};
use crate::storage::ProgressStore;

/// File-based progress storage.
///
/// Stores the progress document as JSON at a configurable path.
/// Uses atomic writes via temp file + rename.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    /// Path of the progress document.
    path: PathBuf,
}

impl FileProgressStore {
    /// Create a store at the default location.
    ///
    /// Uses `~/.keyflow/progress.json` or `$KEYFLOW_HOME/progress.json`.
    pub fn new() -> Result<Self> {
        let path = progress_path().ok_or_else(|| {
            KeyflowError::config("Could not determine progress path (no home directory)")
        })?;
        Self::with_path(path)
    }

    /// Create a store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| KeyflowError::storage(parent, e))?;
            }
        }

        Ok(Self { path })
    }

    /// The path this store writes to.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "progress.json".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    /// Write the document atomically using temp file + rename.
    fn atomic_write(&self, progress: &Progress) -> Result<()> {
        let temp_path = self.temp_path();
        let json = serde_json::to_string_pretty(progress)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| KeyflowError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| KeyflowError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| KeyflowError::storage(&temp_path, e))?;
        }

        // Rename is atomic on POSIX.
        fs::rename(&temp_path, &self.path).map_err(|e| KeyflowError::storage(&self.path, e))?;

        Ok(())
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> Result<Option<Progress>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| KeyflowError::storage(&self.path, e))?;
        let progress: Progress = serde_json::from_str(&content)?;

        Ok(Some(progress))
    }

    fn save(&self, progress: &Progress) -> Result<()> {
        self.atomic_write(progress)
    }
}
