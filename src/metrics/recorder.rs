//! Live keystroke metrics for a single practice session.
//!
//! The recorder consumes one keystroke at a time and maintains the counters
//! behind the three numbers the trainer shows live: words per minute,
//! accuracy, and reaction time. One recorder instance covers exactly one
//! lesson or drill attempt; `start` resets it for the next.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::Clock;

/// Hit/error counters for a single expected character.
///
/// Used both per-session (in [`SessionStats`]) and accumulated across
/// sessions in persisted progress. `errors <= hits` always.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStats {
    /// Times this character was expected.
    pub hits: u64,
    /// Times a different character was typed instead.
    pub errors: u64,
}

impl KeyStats {
    /// Error rate for this key, 0.0 when it was never expected.
    pub fn error_rate(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.errors as f64 / self.hits as f64
        }
    }
}

/// Point-in-time metrics returned after each keystroke.
///
/// All fields are zero when the session is already finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMetrics {
    /// Words per minute, `(correct + errors) / 5` per elapsed minute.
    pub wpm: u32,
    /// Percentage of keystrokes matching the expected character, 0..=100.
    pub accuracy: u32,
    /// Gap to the previous keystroke in milliseconds, 0 for the first.
    pub reaction_ms: u64,
}

/// Final statistics for a completed session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Words per minute over the whole session.
    pub wpm: u32,
    /// Overall accuracy percentage, 0..=100.
    pub accuracy: u32,
    /// Arithmetic mean of all keystroke gaps in milliseconds.
    pub mean_reaction_ms: u64,
    /// Per-character hit/error counts, keyed by the expected character.
    pub per_key: BTreeMap<char, KeyStats>,
}

/// Records keystrokes for one lesson or drill attempt.
///
/// Invariant: `typed == correct + errors` after every recorded keystroke.
#[derive(Debug)]
pub struct MetricsRecorder<C: Clock> {
    clock: C,
    text: Vec<char>,
    start_ms: u64,
    prev_keystroke_ms: Option<u64>,
    typed: u64,
    correct: u64,
    errors: u64,
    per_key: BTreeMap<char, KeyStats>,
    reaction_intervals: Vec<u64>,
    finished: bool,
}

impl<C: Clock> MetricsRecorder<C> {
    /// Create a recorder with no active session.
    pub fn new(clock: C) -> Self {
        let start_ms = clock.now_ms();
        Self {
            clock,
            text: Vec::new(),
            start_ms,
            prev_keystroke_ms: None,
            typed: 0,
            correct: 0,
            errors: 0,
            per_key: BTreeMap::new(),
            reaction_intervals: Vec::new(),
            finished: true,
        }
    }

    /// Reset all session state and begin timing a new attempt over `text`.
    pub fn start(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.start_ms = self.clock.now_ms();
        self.prev_keystroke_ms = None;
        self.typed = 0;
        self.correct = 0;
        self.errors = 0;
        self.per_key.clear();
        self.reaction_intervals.clear();
        self.finished = false;
    }

    /// Length of the expected text in characters.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// The expected character at `index`, if any.
    pub fn char_at(&self, index: usize) -> Option<char> {
        self.text.get(index).copied()
    }

    /// Record one keystroke against the expected character.
    ///
    /// Returns zeroed metrics without mutating anything once the session is
    /// finished.
    pub fn record_key(&mut self, typed: char, expected: char) -> LiveMetrics {
        if self.finished {
            return LiveMetrics::default();
        }

        let now = self.clock.now_ms();
        if let Some(prev) = self.prev_keystroke_ms {
            self.reaction_intervals.push(now.saturating_sub(prev));
        }
        self.prev_keystroke_ms = Some(now);

        self.typed += 1;
        let entry = self.per_key.entry(expected).or_default();
        entry.hits += 1;
        if typed == expected {
            self.correct += 1;
        } else {
            self.errors += 1;
            entry.errors += 1;
        }

        LiveMetrics {
            wpm: self.wpm_at(now),
            accuracy: self.accuracy(),
            reaction_ms: self.reaction_intervals.last().copied().unwrap_or(0),
        }
    }

    /// Mark the session finished. Irreversible until the next `start`.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Whether the session has been finished.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Statistics evaluated at call time.
    ///
    /// WPM and accuracy use the same formulas as [`record_key`]; the
    /// reaction figure is the mean over all recorded keystroke gaps.
    ///
    /// [`record_key`]: MetricsRecorder::record_key
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            wpm: self.wpm_at(self.clock.now_ms()),
            accuracy: self.accuracy(),
            mean_reaction_ms: self.mean_reaction_ms(),
            per_key: self.per_key.clone(),
        }
    }

    fn wpm_at(&self, now_ms: u64) -> u32 {
        let elapsed_minutes = now_ms.saturating_sub(self.start_ms) as f64 / 60_000.0;
        if elapsed_minutes <= 0.0 {
            return 0;
        }
        let words = (self.correct + self.errors) as f64 / 5.0;
        (words / elapsed_minutes).max(0.0).round() as u32
    }

    fn accuracy(&self) -> u32 {
        if self.typed == 0 {
            return 100;
        }
        let pct = self.correct as f64 / self.typed as f64 * 100.0;
        pct.clamp(0.0, 100.0).round() as u32
    }

    fn mean_reaction_ms(&self) -> u64 {
        if self.reaction_intervals.is_empty() {
            return 0;
        }
        let sum: u64 = self.reaction_intervals.iter().sum();
        (sum as f64 / self.reaction_intervals.len() as f64).round() as u64
    }
}
