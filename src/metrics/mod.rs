//! Keystroke metrics for keyflow.
//!
//! This module provides the metrics recorder that turns raw keystrokes into
//! live WPM/accuracy/reaction figures, plus the clock abstraction it is
//! timed with.

pub mod clock;
pub mod recorder;

pub use clock::{Clock, ManualClock, SystemClock};
pub use recorder::{KeyStats, LiveMetrics, MetricsRecorder, SessionStats};
