//! keyflow - Adaptive Typing Tutor
//!
//! keyflow presents practice text, measures typing performance in real
//! time, adapts lesson difficulty toward a target accuracy band, schedules
//! targeted drills for error-prone keys, and delivers motivational
//! feedback. It runs entirely in-process for a single user; rendering and
//! input wiring belong to the embedding presentation layer.

pub mod config;
pub mod curriculum;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod session;
pub mod storage;

pub use config::Config;
pub use curriculum::{Curriculum, Lesson, Level};
pub use engine::{
    AdaptiveEngine, HistoryEntry, Progress, BADGE_ACCURACY, BADGE_WPM, MUSCLE_MEMORY_ROUTINE,
    STAGNATION_MESSAGES,
};
pub use error::{FailOpen, KeyflowError, Result};
pub use metrics::{Clock, KeyStats, LiveMetrics, ManualClock, MetricsRecorder, SessionStats, SystemClock};
pub use session::{
    CompletionOutcome, KeystrokeOutcome, NextAction, SessionOrchestrator, SessionPhase,
};
pub use storage::{FileProgressStore, MemoryProgressStore, ProgressStore};
