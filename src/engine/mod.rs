//! The adaptive difficulty engine for keyflow.
//!
//! The engine owns the persisted [`Progress`] and makes every
//! cross-session decision: curriculum movement after a finished lesson,
//! stagnation detection over the recent history, selection of error-prone
//! keys, and the drill text that targets them. Every mutation is written
//! through the injected [`ProgressStore`]; a failing store is logged and
//! the engine carries on with in-memory state.

pub mod feedback;
pub mod progress;

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::Config;
use crate::curriculum::{Curriculum, Level};
use crate::error::{FailOpen, Result};
use crate::metrics::{KeyStats, SessionStats};
use crate::storage::ProgressStore;

pub use feedback::{MUSCLE_MEMORY_ROUTINE, STAGNATION_MESSAGES};
pub use progress::{HistoryEntry, Progress};

/// Badge id for the speed threshold.
pub const BADGE_WPM: &str = "wpm50";
/// Badge id for the accuracy threshold.
pub const BADGE_ACCURACY: &str = "acc90";

/// Adaptive difficulty and spaced-repetition engine.
///
/// Holds the one live [`Progress`] document for the active user. All state
/// is explicit; nothing here is a process-wide singleton.
pub struct AdaptiveEngine<S: ProgressStore> {
    store: S,
    curriculum: Curriculum,
    config: Config,
    progress: Progress,
}

impl<S: ProgressStore> AdaptiveEngine<S> {
    /// Create an engine over the standard curriculum.
    ///
    /// Loads progress from the store once; an unreadable or absent document
    /// fails open to defaults.
    pub fn new(store: S, config: Config) -> Self {
        Self::with_curriculum(store, config, Curriculum::standard())
    }

    /// Create an engine over a custom curriculum.
    pub fn with_curriculum(store: S, config: Config, curriculum: Curriculum) -> Self {
        let mut progress: Progress = store
            .load()
            .fail_open_default("loading progress")
            .unwrap_or_default();

        // A save from an older catalogue may point at a lesson that no
        // longer exists; snap back to the first lesson.
        if curriculum.lesson(progress.level, progress.index).is_none() {
            tracing::warn!(
                level = %progress.level,
                index = progress.index,
                "saved position not in curriculum, resetting"
            );
            if let Some(first) = curriculum.first() {
                progress.level = first.level;
                progress.index = first.index;
            }
        }

        Self {
            store,
            curriculum,
            config,
            progress,
        }
    }

    /// The current progress document.
    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// The curriculum this engine moves through.
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// The current curriculum position.
    pub fn position(&self) -> (Level, usize) {
        (self.progress.level, self.progress.index)
    }

    /// Jump to an explicit lesson.
    pub fn set_position(&mut self, level: Level, index: usize) -> Result<()> {
        if self.curriculum.lesson(level, index).is_none() {
            return Err(crate::error::KeyflowError::unknown_lesson(level, index));
        }
        self.progress.level = level;
        self.progress.index = index;
        self.persist();
        Ok(())
    }

    /// Move the curriculum pointer based on a finished session's accuracy.
    ///
    /// Above the advance threshold the pointer moves forward (wrapping into
    /// the next level's first lesson), below the retreat threshold it moves
    /// back (wrapping into the previous level's last lesson). Either
    /// curriculum boundary absorbs the move as stay-in-place; inside the
    /// band the lesson repeats.
    pub fn choose_next_lesson(&mut self, accuracy: u32) -> (Level, usize) {
        let (level, index) = self.position();

        let next = if accuracy > self.config.engine.advance_accuracy {
            self.advanced_from(level, index)
        } else if accuracy < self.config.engine.retreat_accuracy {
            self.retreated_from(level, index)
        } else {
            (level, index)
        };

        if next != (level, index) {
            tracing::debug!(
                from = %format!("{level} #{index}"),
                to = %format!("{} #{}", next.0, next.1),
                accuracy,
                "curriculum moved"
            );
            self.progress.level = next.0;
            self.progress.index = next.1;
            self.persist();
        }
        next
    }

    fn advanced_from(&self, level: Level, index: usize) -> (Level, usize) {
        if index + 1 < self.curriculum.level_len(level) {
            return (level, index + 1);
        }
        match level.next() {
            Some(next) if self.curriculum.level_len(next) > 0 => (next, 0),
            _ => (level, index), // top of curriculum
        }
    }

    fn retreated_from(&self, level: Level, index: usize) -> (Level, usize) {
        if index > 0 {
            return (level, index - 1);
        }
        match level.prev() {
            Some(prev) if self.curriculum.level_len(prev) > 0 => {
                (prev, self.curriculum.level_len(prev) - 1)
            }
            _ => (level, index), // bottom of curriculum
        }
    }

    /// Fold a session's per-key counters into the accumulated error rates.
    ///
    /// Accumulation is additive and never reset: calling this twice with
    /// the same map doubles the counts.
    pub fn accumulate_key_stats(&mut self, per_key: &BTreeMap<char, KeyStats>) {
        for (key, stats) in per_key {
            let entry = self.progress.error_rates.entry(*key).or_default();
            entry.hits += stats.hits;
            entry.errors += stats.errors;
        }
        self.persist();
    }

    /// Append a session result to the bounded history.
    pub fn update_history(&mut self, entry: HistoryEntry) {
        self.progress.history.push(entry);
        let cap = self.config.engine.history_cap;
        while self.progress.history.len() > cap {
            self.progress.history.remove(0);
        }
        self.progress.sessions_completed += 1;
        self.persist();
    }

    /// Whether recent performance has flatlined.
    ///
    /// Deltas are computed over the entire history; only the trailing
    /// window of them is examined, and every one must be inside the
    /// epsilon band for both WPM and accuracy. Too little history means
    /// not stagnant.
    pub fn is_stagnant(&self) -> bool {
        let history = &self.progress.history;
        let window = self.config.engine.stagnation_window;
        if history.len() < window {
            return false;
        }

        let deltas: Vec<(i64, i64)> = history
            .windows(2)
            .map(|w| {
                (
                    w[1].wpm as i64 - w[0].wpm as i64,
                    w[1].accuracy as i64 - w[0].accuracy as i64,
                )
            })
            .collect();

        let epsilon = self.config.engine.stagnation_epsilon as i64;
        let tail = &deltas[deltas.len().saturating_sub(window)..];
        tail.iter()
            .all(|(d_wpm, d_acc)| d_wpm.abs() < epsilon && d_acc.abs() < epsilon)
    }

    /// Keys whose accumulated error rate qualifies them for a drill.
    ///
    /// A key qualifies once it has enough hits to be meaningful and its
    /// error rate reaches the configured threshold. Returned in ascending
    /// character order.
    pub fn high_error_keys(&self) -> Vec<char> {
        self.progress
            .error_rates
            .iter()
            .filter(|(_, stats)| {
                stats.hits >= self.config.drill.min_hits
                    && stats.error_rate() >= self.config.drill.error_rate_threshold
            })
            .map(|(key, _)| *key)
            .collect()
    }

    /// Synthesize drill text targeting the given keys.
    ///
    /// Produces space-separated clusters with every character drawn
    /// uniformly (with replacement) from `keys`. Empty input produces an
    /// empty string.
    pub fn generate_drill<R: Rng + ?Sized>(&self, keys: &[char], rng: &mut R) -> String {
        if keys.is_empty() {
            return String::new();
        }

        let clusters: Vec<String> = (0..self.config.drill.clusters)
            .map(|_| {
                (0..self.config.drill.cluster_len)
                    .map(|_| *keys.choose(rng).expect("keys is non-empty"))
                    .collect()
            })
            .collect();
        clusters.join(" ")
    }

    /// The fixed warmup routine, independent of any state.
    pub fn muscle_memory_routine(&self) -> &'static str {
        feedback::MUSCLE_MEMORY_ROUTINE
    }

    /// Award any badges the session earns, returning the newly earned ids.
    ///
    /// Each badge is awarded at most once per user, ever.
    pub fn award_badges(&mut self, stats: &SessionStats) -> Vec<String> {
        let mut awarded = Vec::new();

        if stats.wpm >= self.config.badges.wpm && self.progress.award_badge(BADGE_WPM) {
            awarded.push(BADGE_WPM.to_string());
        }
        if stats.accuracy >= self.config.badges.accuracy && self.progress.award_badge(BADGE_ACCURACY)
        {
            awarded.push(BADGE_ACCURACY.to_string());
        }

        if !awarded.is_empty() {
            self.persist();
        }
        awarded
    }

    /// The next stagnation message in rotation.
    pub fn stagnation_message(&mut self) -> &'static str {
        let message = feedback::stagnation_message(self.progress.feedback_cursor);
        self.progress.feedback_cursor = self.progress.feedback_cursor.wrapping_add(1);
        self.persist();
        message
    }

    /// Write-through persistence; failures are logged, never propagated.
    fn persist(&mut self) {
        self.progress.touch();
        self.store
            .save(&self.progress)
            .fail_open_default("saving progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyflowError;
    use crate::storage::MemoryProgressStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn engine() -> AdaptiveEngine<Arc<MemoryProgressStore>> {
        AdaptiveEngine::new(Arc::new(MemoryProgressStore::new()), Config::default())
    }

    fn engine_with_store() -> (AdaptiveEngine<Arc<MemoryProgressStore>>, Arc<MemoryProgressStore>) {
        let store = Arc::new(MemoryProgressStore::new());
        let engine = AdaptiveEngine::new(Arc::clone(&store), Config::default());
        (engine, store)
    }

    fn entry(wpm: u32, accuracy: u32) -> HistoryEntry {
        HistoryEntry { wpm, accuracy }
    }

    // --- curriculum movement ---

    #[test]
    fn test_advance_within_level() {
        let mut engine = engine();
        assert_eq!(engine.choose_next_lesson(95), (Level::Beginner, 1));
    }

    #[test]
    fn test_advance_wraps_to_next_level() {
        let mut engine = engine();
        engine.set_position(Level::Beginner, 4).unwrap();
        assert_eq!(engine.choose_next_lesson(95), (Level::Intermediate, 0));
    }

    #[test]
    fn test_advance_at_top_stays() {
        let mut engine = engine();
        let last = engine.curriculum().level_len(Level::Advanced) - 1;
        engine.set_position(Level::Advanced, last).unwrap();
        assert_eq!(engine.choose_next_lesson(95), (Level::Advanced, last));
    }

    #[test]
    fn test_retreat_within_level() {
        let mut engine = engine();
        engine.set_position(Level::Beginner, 3).unwrap();
        assert_eq!(engine.choose_next_lesson(70), (Level::Beginner, 2));
    }

    #[test]
    fn test_retreat_wraps_to_previous_level() {
        let mut engine = engine();
        engine.set_position(Level::Intermediate, 0).unwrap();
        assert_eq!(engine.choose_next_lesson(70), (Level::Beginner, 4));
    }

    #[test]
    fn test_retreat_at_bottom_stays() {
        let mut engine = engine();
        assert_eq!(engine.choose_next_lesson(70), (Level::Beginner, 0));
    }

    #[test]
    fn test_band_repeats_lesson() {
        let mut engine = engine();
        engine.set_position(Level::Beginner, 2).unwrap();
        assert_eq!(engine.choose_next_lesson(80), (Level::Beginner, 2));
        assert_eq!(engine.choose_next_lesson(85), (Level::Beginner, 2));
        assert_eq!(engine.choose_next_lesson(90), (Level::Beginner, 2));
    }

    #[test]
    fn test_transition_persists() {
        let (mut engine, store) = engine_with_store();
        engine.choose_next_lesson(95);

        let saved = store.load().unwrap().unwrap();
        assert_eq!((saved.level, saved.index), (Level::Beginner, 1));
    }

    #[test]
    fn test_set_position_rejects_unknown_lesson() {
        let mut engine = engine();
        assert!(matches!(
            engine.set_position(Level::Beginner, 99),
            Err(KeyflowError::UnknownLesson { .. })
        ));
    }

    #[test]
    fn test_loads_saved_progress() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut progress = Progress::default();
        progress.level = Level::Intermediate;
        progress.index = 3;
        store.save(&progress).unwrap();

        let engine = AdaptiveEngine::new(store, Config::default());
        assert_eq!(engine.position(), (Level::Intermediate, 3));
    }

    #[test]
    fn test_invalid_saved_position_resets() {
        let store = Arc::new(MemoryProgressStore::new());
        let mut progress = Progress::default();
        progress.index = 999;
        store.save(&progress).unwrap();

        let engine = AdaptiveEngine::new(store, Config::default());
        assert_eq!(engine.position(), (Level::Beginner, 0));
    }

    // --- accumulation ---

    #[test]
    fn test_accumulate_key_stats_is_additive() {
        let mut engine = engine();
        let mut per_key = BTreeMap::new();
        per_key.insert('q', KeyStats { hits: 3, errors: 1 });
        per_key.insert('z', KeyStats { hits: 2, errors: 0 });

        engine.accumulate_key_stats(&per_key);
        engine.accumulate_key_stats(&per_key);

        let rates = &engine.progress().error_rates;
        assert_eq!(rates[&'q'], KeyStats { hits: 6, errors: 2 });
        assert_eq!(rates[&'z'], KeyStats { hits: 4, errors: 0 });
    }

    #[test]
    fn test_history_is_capped() {
        let mut engine = engine();
        for i in 0..8 {
            engine.update_history(entry(30 + i, 80));
        }

        let history = &engine.progress().history;
        assert_eq!(history.len(), 5);
        // Oldest entries evicted first.
        assert_eq!(history[0].wpm, 33);
        assert_eq!(history[4].wpm, 37);
        assert_eq!(engine.progress().sessions_completed, 8);
    }

    // --- stagnation ---

    #[test]
    fn test_not_stagnant_with_short_history() {
        let mut engine = engine();
        engine.update_history(entry(50, 80));
        engine.update_history(entry(50, 80));
        assert!(!engine.is_stagnant());
    }

    #[test]
    fn test_stagnant_with_flat_deltas() {
        let mut engine = engine();
        for e in [entry(50, 80), entry(51, 81), entry(50, 80), entry(51, 81)] {
            engine.update_history(e);
        }
        assert!(engine.is_stagnant());
    }

    #[test]
    fn test_not_stagnant_when_a_recent_delta_is_large() {
        let mut engine = engine();
        for e in [entry(50, 80), entry(51, 81), entry(55, 80), entry(51, 81)] {
            engine.update_history(e);
        }
        assert!(!engine.is_stagnant());
    }

    #[test]
    fn test_old_deltas_outside_window_are_ignored() {
        let mut engine = engine();
        // The 30 -> 50 jump is the oldest delta of four; only the last
        // three are inspected.
        for e in [
            entry(30, 80),
            entry(50, 80),
            entry(50, 81),
            entry(51, 80),
            entry(50, 81),
        ] {
            engine.update_history(e);
        }
        assert!(engine.is_stagnant());
    }

    #[test]
    fn test_accuracy_delta_alone_breaks_stagnation() {
        let mut engine = engine();
        for e in [entry(50, 80), entry(50, 85), entry(50, 80), entry(50, 85)] {
            engine.update_history(e);
        }
        assert!(!engine.is_stagnant());
    }

    // --- high-error keys and drills ---

    #[test]
    fn test_high_error_keys_thresholds() {
        let mut engine = engine();
        let mut per_key = BTreeMap::new();
        // Below the hit floor even though every hit was an error.
        per_key.insert('a', KeyStats { hits: 4, errors: 4 });
        // Above the floor with rate 0.2 >= 0.15.
        per_key.insert('s', KeyStats { hits: 10, errors: 2 });
        // Above the floor but clean.
        per_key.insert('d', KeyStats { hits: 20, errors: 1 });
        engine.accumulate_key_stats(&per_key);

        assert_eq!(engine.high_error_keys(), vec!['s']);
    }

    #[test]
    fn test_high_error_keys_ascending_order() {
        let mut engine = engine();
        let mut per_key = BTreeMap::new();
        per_key.insert('z', KeyStats { hits: 10, errors: 5 });
        per_key.insert('a', KeyStats { hits: 10, errors: 5 });
        per_key.insert('m', KeyStats { hits: 10, errors: 5 });
        engine.accumulate_key_stats(&per_key);

        assert_eq!(engine.high_error_keys(), vec!['a', 'm', 'z']);
    }

    #[test]
    fn test_generate_drill_shape() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(7);

        let drill = engine.generate_drill(&['a', 's'], &mut rng);
        let clusters: Vec<&str> = drill.split(' ').collect();

        assert_eq!(clusters.len(), 10);
        for cluster in clusters {
            assert_eq!(cluster.len(), 4);
            assert!(cluster.chars().all(|c| c == 'a' || c == 's'));
        }
    }

    #[test]
    fn test_generate_drill_empty_keys() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(engine.generate_drill(&[], &mut rng), "");
    }

    #[test]
    fn test_generate_drill_uses_all_offered_keys_eventually() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(42);
        let drill = engine.generate_drill(&['q', 'p'], &mut rng);
        // 40 uniform draws from two keys; both appear for any sane seed.
        assert!(drill.contains('q'));
        assert!(drill.contains('p'));
    }

    // --- badges and feedback ---

    #[test]
    fn test_badges_awarded_once() {
        let mut engine = engine();
        let stats = SessionStats {
            wpm: 55,
            accuracy: 95,
            ..Default::default()
        };

        let first = engine.award_badges(&stats);
        assert_eq!(first, vec![BADGE_WPM.to_string(), BADGE_ACCURACY.to_string()]);

        let second = engine.award_badges(&stats);
        assert!(second.is_empty());
    }

    #[test]
    fn test_badges_below_threshold_not_awarded() {
        let mut engine = engine();
        let stats = SessionStats {
            wpm: 49,
            accuracy: 89,
            ..Default::default()
        };
        assert!(engine.award_badges(&stats).is_empty());
    }

    #[test]
    fn test_stagnation_messages_rotate() {
        let mut engine = engine();
        let first = engine.stagnation_message();
        let second = engine.stagnation_message();
        assert_ne!(first, second);

        // Wraps around the list.
        for _ in 0..STAGNATION_MESSAGES.len() - 2 {
            engine.stagnation_message();
        }
        assert_eq!(engine.stagnation_message(), first);
    }

    #[test]
    fn test_muscle_memory_routine_is_fixed() {
        let engine = engine();
        assert_eq!(engine.muscle_memory_routine(), MUSCLE_MEMORY_ROUTINE);
    }

    // --- fail-open persistence ---

    struct FailingStore;

    impl ProgressStore for FailingStore {
        fn load(&self) -> crate::error::Result<Option<Progress>> {
            Err(KeyflowError::serde("load failure"))
        }

        fn save(&self, _progress: &Progress) -> crate::error::Result<()> {
            Err(KeyflowError::serde("save failure"))
        }
    }

    #[test]
    fn test_store_failures_are_nonfatal() {
        let mut engine = AdaptiveEngine::new(FailingStore, Config::default());
        // Load failure fell open to defaults.
        assert_eq!(engine.position(), (Level::Beginner, 0));

        // Save failures keep the in-memory state moving.
        assert_eq!(engine.choose_next_lesson(95), (Level::Beginner, 1));
        engine.update_history(entry(40, 85));
        assert_eq!(engine.progress().history.len(), 1);
    }
}
