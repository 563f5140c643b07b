//! Session lifecycle orchestration.
//!
//! The orchestrator drives one practice attempt at a time: it selects the
//! text, forwards keystrokes to the metrics recorder, and on completion
//! runs the adaptive engine and reports what should happen next. All
//! transitions are synchronous method calls; the only deferred element is
//! the pending drill slot, which a presentation layer starts after its own
//! delay and which any new action supersedes.

use rand::Rng;
use serde::Serialize;

use crate::curriculum::{Lesson, Level};
use crate::engine::{AdaptiveEngine, HistoryEntry};
use crate::error::Result;
use crate::metrics::{Clock, LiveMetrics, MetricsRecorder, SessionStats};
use crate::storage::ProgressStore;

/// Lifecycle phase of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No attempt in progress.
    Idle,
    /// An attempt is accepting keystrokes.
    Active,
    /// The attempt finished; awaiting the next start.
    Completed,
}

/// Result of one accepted keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeystrokeOutcome {
    /// Live metrics after this keystroke.
    pub live: LiveMetrics,
    /// Position of the character this keystroke was matched against.
    pub index: usize,
    /// Whether the typed character matched the expected one.
    pub correct: bool,
    /// Whether this keystroke consumed the last character of the text.
    pub finished: bool,
}

/// What the presentation layer should do after a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextAction {
    /// Start a targeted drill with this text (after any presentation
    /// delay; the drill is parked in the pending slot until then).
    Drill { text: String },
    /// The drill is done; the same curriculum lesson was reloaded and is
    /// active again.
    RepeatLesson,
    /// An ordinary lesson finished; the curriculum pointer already moved.
    /// Awaiting an explicit advance.
    LessonComplete { level: Level, index: usize },
}

/// Everything produced by completing a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionOutcome {
    /// Final session statistics.
    pub stats: SessionStats,
    /// Badge ids newly earned by this session.
    pub badges_awarded: Vec<String>,
    /// Caustic feedback when performance has flatlined.
    pub stagnation_message: Option<&'static str>,
    /// The transition the presentation layer should drive next.
    pub next_action: NextAction,
}

/// Drives lessons and drills through their lifecycle.
pub struct SessionOrchestrator<S: ProgressStore, C: Clock, R: Rng> {
    engine: AdaptiveEngine<S>,
    recorder: MetricsRecorder<C>,
    rng: R,
    phase: SessionPhase,
    cursor: usize,
    is_drill: bool,
    pending_drill: Option<String>,
}

impl<S: ProgressStore, C: Clock, R: Rng> SessionOrchestrator<S, C, R> {
    /// Create an orchestrator around an engine, clock, and randomness
    /// source.
    pub fn new(engine: AdaptiveEngine<S>, clock: C, rng: R) -> Self {
        Self {
            engine,
            recorder: MetricsRecorder::new(clock),
            rng,
            phase: SessionPhase::Idle,
            cursor: 0,
            is_drill: false,
            pending_drill: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the active or just-finished attempt is a drill.
    pub fn is_drill(&self) -> bool {
        self.is_drill
    }

    /// The underlying adaptive engine.
    pub fn engine(&self) -> &AdaptiveEngine<S> {
        &self.engine
    }

    /// The lesson the curriculum pointer rests on.
    pub fn current_lesson(&self) -> &Lesson {
        let (level, index) = self.engine.position();
        self.engine
            .curriculum()
            .lesson(level, index)
            .expect("curriculum position is always valid")
    }

    /// Jump to an explicit lesson and go idle.
    ///
    /// Cancels any pending drill.
    pub fn set_lesson(&mut self, level: Level, index: usize) -> Result<()> {
        self.engine.set_position(level, index)?;
        self.pending_drill = None;
        self.is_drill = false;
        self.phase = SessionPhase::Idle;
        Ok(())
    }

    /// The curriculum partitioned by level, in catalogue order.
    pub fn lesson_list(&self) -> Vec<(Level, Vec<&Lesson>)> {
        self.engine.curriculum().grouped()
    }

    /// Start the current curriculum lesson.
    ///
    /// Supersedes any pending drill.
    pub fn start_lesson(&mut self) {
        let text = self.current_lesson().text;
        self.begin(text, false);
    }

    /// Start a drill over externally supplied text.
    ///
    /// Supersedes any pending drill (including the one this text came
    /// from).
    pub fn start_drill(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.begin(&text, true);
    }

    /// Start the parked drill, if one is pending.
    ///
    /// Returns false when nothing was pending (it may have been superseded
    /// by another start in the meantime).
    pub fn start_pending_drill(&mut self) -> bool {
        match self.pending_drill.take() {
            Some(text) => {
                self.begin(&text, true);
                true
            }
            None => false,
        }
    }

    /// The parked drill text, if any.
    pub fn pending_drill(&self) -> Option<&str> {
        self.pending_drill.as_deref()
    }

    /// Explicit advance after a `LessonComplete`: start the lesson the
    /// curriculum pointer now rests on.
    pub fn advance_to_next_lesson(&mut self) {
        self.start_lesson();
    }

    fn begin(&mut self, text: &str, is_drill: bool) {
        self.recorder.start(text);
        self.cursor = 0;
        self.is_drill = is_drill;
        self.pending_drill = None;
        self.phase = SessionPhase::Active;
        tracing::debug!(is_drill, len = text.len(), "session started");
    }

    /// Feed one input event through the recorder.
    ///
    /// Only single printable characters are accepted; anything else (and
    /// any input outside an active attempt, or past the end of the text)
    /// is silently ignored and returns `None`.
    pub fn record_keystroke(&mut self, input: &str) -> Option<KeystrokeOutcome> {
        if self.phase != SessionPhase::Active {
            return None;
        }

        let mut chars = input.chars();
        let typed = chars.next()?;
        if chars.next().is_some() || typed.is_control() {
            return None;
        }

        let expected = self.recorder.char_at(self.cursor)?;
        let live = self.recorder.record_key(typed, expected);
        let index = self.cursor;
        self.cursor += 1;

        Some(KeystrokeOutcome {
            live,
            index,
            correct: typed == expected,
            finished: self.cursor >= self.recorder.text_len(),
        })
    }

    /// Finalize the attempt and decide what happens next.
    ///
    /// Completion policy, in order: schedule a drill when high-error keys
    /// exist and this was not itself a drill; otherwise return to the same
    /// lesson when a drill just finished; otherwise move the curriculum
    /// pointer and wait for an explicit advance.
    ///
    /// Returns `None` unless an attempt is active, so a stray or duplicated
    /// completion event never touches progress.
    pub fn complete_session(&mut self) -> Option<CompletionOutcome> {
        if self.phase != SessionPhase::Active {
            return None;
        }
        let was_drill = self.is_drill;

        self.recorder.finish();
        let stats = self.recorder.stats();

        self.engine.update_history(HistoryEntry {
            wpm: stats.wpm,
            accuracy: stats.accuracy,
        });
        self.engine.accumulate_key_stats(&stats.per_key);
        let badges_awarded = self.engine.award_badges(&stats);
        let stagnation_message = if self.engine.is_stagnant() {
            Some(self.engine.stagnation_message())
        } else {
            None
        };

        let weak_keys = self.engine.high_error_keys();
        let next_action = if !weak_keys.is_empty() && !was_drill {
            let text = self.engine.generate_drill(&weak_keys, &mut self.rng);
            self.pending_drill = Some(text.clone());
            self.phase = SessionPhase::Completed;
            NextAction::Drill { text }
        } else if was_drill {
            // Back to the lesson the drill interrupted; no curriculum
            // movement for drills.
            self.is_drill = false;
            self.start_lesson();
            NextAction::RepeatLesson
        } else {
            let (level, index) = self.engine.choose_next_lesson(stats.accuracy);
            self.phase = SessionPhase::Completed;
            NextAction::LessonComplete { level, index }
        };

        Some(CompletionOutcome {
            stats,
            badges_awarded,
            stagnation_message,
            next_action,
        })
    }
}
