//! Persistent learner progress.
//!
//! `Progress` is the single piece of state that survives across sessions:
//! the curriculum position, earned badges, a short performance history, and
//! per-key error counters accumulated over all time. It is loaded once at
//! startup and written through after every mutation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::curriculum::Level;
use crate::metrics::KeyStats;

/// One completed session's headline numbers, kept in a short history for
/// stagnation detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Words per minute for the session.
    pub wpm: u32,
    /// Accuracy percentage for the session, 0..=100.
    pub accuracy: u32,
}

/// Cross-session learner state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Current curriculum level.
    pub level: Level,
    /// Current lesson index within the level.
    pub index: usize,
    /// Earned badges, keyed by badge id. Monotonic: once true, never reset.
    pub badges: BTreeMap<String, bool>,
    /// Most recent session results, oldest first. Capped by the engine.
    pub history: Vec<HistoryEntry>,
    /// Per-key hit/error counters accumulated across all sessions.
    pub error_rates: BTreeMap<char, KeyStats>,
    /// Rotation cursor into the stagnation message list.
    pub feedback_cursor: usize,
    /// Total sessions completed, drills included.
    pub sessions_completed: u64,
    /// When this progress was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            level: Level::Beginner,
            index: 0,
            badges: BTreeMap::new(),
            history: Vec::new(),
            error_rates: BTreeMap::new(),
            feedback_cursor: 0,
            sessions_completed: 0,
            updated_at: Utc::now(),
        }
    }
}

impl Progress {
    /// Whether a badge has been earned.
    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.get(id).copied().unwrap_or(false)
    }

    /// Mark a badge as earned. Returns true if it was newly awarded.
    pub fn award_badge(&mut self, id: &str) -> bool {
        if self.has_badge(id) {
            return false;
        }
        self.badges.insert(id.to_string(), true);
        true
    }

    /// Update the mutation timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_starts_at_first_lesson() {
        let progress = Progress::default();
        assert_eq!(progress.level, Level::Beginner);
        assert_eq!(progress.index, 0);
        assert!(progress.history.is_empty());
        assert!(progress.error_rates.is_empty());
    }

    #[test]
    fn test_badge_awarded_once() {
        let mut progress = Progress::default();
        assert!(!progress.has_badge("wpm50"));
        assert!(progress.award_badge("wpm50"));
        assert!(progress.has_badge("wpm50"));
        assert!(!progress.award_badge("wpm50"));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut progress = Progress::default();
        progress.level = Level::Intermediate;
        progress.index = 3;
        progress.award_badge("acc90");
        progress.history.push(HistoryEntry {
            wpm: 42,
            accuracy: 88,
        });
        progress
            .error_rates
            .insert('q', KeyStats { hits: 7, errors: 3 });

        let json = serde_json::to_string(&progress).unwrap();
        let restored: Progress = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, progress);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        // Older saves without the supplemental counters still load.
        let json = r#"{"level":"beginner","index":2}"#;
        let progress: Progress = serde_json::from_str(json).unwrap();
        assert_eq!(progress.index, 2);
        assert_eq!(progress.sessions_completed, 0);
        assert_eq!(progress.feedback_cursor, 0);
    }
}
