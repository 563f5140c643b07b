//! In-memory progress storage for testing.
//!
//! This module provides a thread-safe in-memory implementation of the
//! ProgressStore trait, primarily for use in unit tests and for embedders
//! that do not want anything written to disk.

use std::sync::RwLock;

use crate::engine::Progress;
use crate::error::Result;
use crate::storage::ProgressStore;

/// In-memory progress store.
///
/// Thread-safe implementation using `RwLock<Option<Progress>>`. The
/// document is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    progress: RwLock<Option<Progress>>,
}

impl MemoryProgressStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a progress document.
    pub fn with_progress(progress: Progress) -> Self {
        Self {
            progress: RwLock::new(Some(progress)),
        }
    }

    /// Whether anything has been saved.
    pub fn is_empty(&self) -> bool {
        self.progress.read().unwrap().is_none()
    }

    /// Drop the stored document.
    pub fn clear(&self) {
        *self.progress.write().unwrap() = None;
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Option<Progress>> {
        Ok(self.progress.read().unwrap().clone())
    }

    fn save(&self, progress: &Progress) -> Result<()> {
        *self.progress.write().unwrap() = Some(progress.clone());
        Ok(())
    }
}
