//! Progress storage traits for keyflow.
//!
//! This module defines the `ProgressStore` port the adaptive engine
//! persists through. Progress is a single document per user, so the port is
//! just load and save.

use std::sync::Arc;

use crate::engine::Progress;
use crate::error::Result;

/// Trait for progress storage backends.
///
/// Implementations persist the single `Progress` document. Load returns
/// `Ok(None)` when nothing has been saved yet; the engine then starts from
/// defaults. Save failures are reported but callers treat them as
/// non-fatal.
pub trait ProgressStore: Send + Sync {
    /// Load the persisted progress, if any.
    fn load(&self) -> Result<Option<Progress>>;

    /// Persist the progress, replacing any previous save.
    fn save(&self, progress: &Progress) -> Result<()>;
}

/// Blanket implementation of ProgressStore for Arc-wrapped stores.
///
/// This allows using `Arc<T>` where `T: ProgressStore` is expected, which
/// is useful for sharing a store between tests and the engine.
impl<T: ProgressStore + ?Sized> ProgressStore for Arc<T> {
    fn load(&self) -> Result<Option<Progress>> {
        (**self).load()
    }

    fn save(&self, progress: &Progress) -> Result<()> {
        (**self).save(progress)
    }
}

/// Test utilities for ProgressStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::curriculum::Level;
    use crate::engine::HistoryEntry;
    use crate::metrics::KeyStats;

    /// Test helper to verify ProgressStore implementations.
    pub fn test_progress_store_round_trip<S: ProgressStore>(store: &S) {
        // Nothing saved yet.
        assert!(store.load().unwrap().is_none());

        // Save a non-trivial progress document.
        let mut progress = Progress::default();
        progress.level = Level::Intermediate;
        progress.index = 2;
        progress.award_badge("wpm50");
        progress.history.push(HistoryEntry {
            wpm: 55,
            accuracy: 93,
        });
        progress
            .error_rates
            .insert(';', KeyStats { hits: 12, errors: 4 });
        store.save(&progress).unwrap();

        // Load returns what was saved.
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, progress);

        // Saving again replaces, not appends.
        progress.index = 3;
        store.save(&progress).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.index, 3);
    }
}
