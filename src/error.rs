//! Unified error types for keyflow with fail-open philosophy.
//!
//! All errors in keyflow follow the fail-open principle: infrastructure
//! errors should never interrupt practice. When progress storage fails we
//! log a warning and continue with in-memory state rather than propagating
//! a failure into the typing loop.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::curriculum::Level;

/// The main error type for keyflow operations.
#[derive(Error, Debug)]
pub enum KeyflowError {
    /// I/O errors from progress file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON parsing/serialization errors for persisted progress.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// A lesson identity that does not exist in the curriculum.
    #[error("unknown lesson: {level} #{index}")]
    UnknownLesson { level: Level, index: usize },

    /// Session lifecycle violations (invalid transitions).
    #[error("invalid state: {message}")]
    InvalidState { message: String },
}

/// A specialized Result type for keyflow operations.
pub type Result<T> = std::result::Result<T, KeyflowError>;

impl KeyflowError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unknown lesson error.
    pub fn unknown_lesson(level: Level, index: usize) -> Self {
        Self::UnknownLesson { level, index }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

impl From<io::Error> for KeyflowError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for KeyflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Provides methods for handling errors according to keyflow's fail-open
/// philosophy: log the error and return a safe default. Used wherever a
/// storage failure must not interrupt a running session.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}
