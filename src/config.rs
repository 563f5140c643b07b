//! Configuration loading for keyflow.
//!
//! Configuration follows a precedence chain:
//! 1. Project config (`.keyflow/config.toml`)
//! 2. User config (`~/.keyflow/config.toml`)
//! 3. Defaults
//!
//! The nearest existing file wins whole. All configuration is optional; the
//! trainer runs with sensible defaults when no config exists, and invalid
//! values are clamped back to defaults rather than refused.

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FailOpen, KeyflowError, Result};

/// Main configuration struct for keyflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Adaptive difficulty thresholds.
    pub engine: EngineConfig,
    /// Targeted drill tuning.
    pub drill: DrillConfig,
    /// Badge award thresholds.
    pub badges: BadgeConfig,
}

/// Adaptive difficulty configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Accuracy strictly above this advances the curriculum.
    pub advance_accuracy: u32,
    /// Accuracy strictly below this retreats the curriculum.
    pub retreat_accuracy: u32,
    /// How many recent session results to keep for stagnation detection.
    pub history_cap: usize,
    /// How many trailing deltas stagnation detection inspects.
    pub stagnation_window: usize,
    /// Deltas with absolute value below this count as "no movement".
    pub stagnation_epsilon: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            advance_accuracy: 90,
            retreat_accuracy: 80,
            history_cap: 5,
            stagnation_window: 3,
            stagnation_epsilon: 2,
        }
    }
}

/// Targeted drill configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DrillConfig {
    /// Minimum error rate (errors / hits) for a key to qualify for drills.
    pub error_rate_threshold: f64,
    /// Keys with fewer accumulated hits than this never qualify.
    pub min_hits: u64,
    /// Number of clusters in a generated drill.
    pub clusters: usize,
    /// Characters per cluster.
    pub cluster_len: usize,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            error_rate_threshold: 0.15,
            min_hits: 5,
            clusters: 10,
            cluster_len: 4,
        }
    }
}

/// Badge award thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BadgeConfig {
    /// Session WPM at or above this earns the speed badge.
    pub wpm: u32,
    /// Session accuracy at or above this earns the accuracy badge.
    pub accuracy: u32,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            wpm: 50,
            accuracy: 90,
        }
    }
}

impl Config {
    /// Load configuration using the precedence chain.
    ///
    /// Unreadable or invalid files fail open to defaults.
    pub fn load() -> Self {
        let path = project_config_path()
            .filter(|p| p.exists())
            .or_else(|| user_config_path().filter(|p| p.exists()));

        match path {
            Some(path) => Self::load_from(&path)
                .fail_open_default("loading config")
                .validated(),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific TOML file.
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| KeyflowError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| KeyflowError::config(e.to_string()))
    }

    /// Replace out-of-range values with their defaults.
    ///
    /// Keeps the rest of the config intact so one bad field doesn't discard
    /// the whole file.
    pub fn validated(mut self) -> Self {
        let engine_defaults = EngineConfig::default();
        let valid_band = self.advance_band_is_valid();
        if !valid_band {
            tracing::warn!(
                advance = self.engine.advance_accuracy,
                retreat = self.engine.retreat_accuracy,
                "invalid accuracy band, using defaults"
            );
            self.engine.advance_accuracy = engine_defaults.advance_accuracy;
            self.engine.retreat_accuracy = engine_defaults.retreat_accuracy;
        }
        if self.engine.history_cap == 0 {
            self.engine.history_cap = engine_defaults.history_cap;
        }
        if self.engine.stagnation_window == 0 {
            self.engine.stagnation_window = engine_defaults.stagnation_window;
        }

        let drill_defaults = DrillConfig::default();
        if !self.drill.error_rate_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.drill.error_rate_threshold)
        {
            self.drill.error_rate_threshold = drill_defaults.error_rate_threshold;
        }
        if self.drill.clusters == 0 {
            self.drill.clusters = drill_defaults.clusters;
        }
        if self.drill.cluster_len == 0 {
            self.drill.cluster_len = drill_defaults.cluster_len;
        }

        self
    }

    fn advance_band_is_valid(&self) -> bool {
        self.engine.advance_accuracy <= 100
            && self.engine.retreat_accuracy < self.engine.advance_accuracy
    }
}

/// The keyflow home directory.
///
/// `$KEYFLOW_HOME` when set, otherwise `~/.keyflow`.
pub fn keyflow_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("KEYFLOW_HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    dirs::home_dir().map(|h| h.join(".keyflow"))
}

/// Path to the user config file (`~/.keyflow/config.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    keyflow_home().map(|h| h.join("config.toml"))
}

/// Path to the project config file (`.keyflow/config.toml`).
pub fn project_config_path() -> Option<PathBuf> {
    Some(PathBuf::from(".keyflow").join("config.toml"))
}

/// Path to the persisted progress file (`~/.keyflow/progress.json`).
pub fn progress_path() -> Option<PathBuf> {
    keyflow_home().map(|h| h.join("progress.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.engine.advance_accuracy, 90);
        assert_eq!(config.engine.retreat_accuracy, 80);
        assert_eq!(config.engine.history_cap, 5);
        assert_eq!(config.drill.min_hits, 5);
        assert_eq!(config.drill.clusters, 10);
        assert_eq!(config.drill.cluster_len, 4);
        assert_eq!(config.badges.wpm, 50);
        assert_eq!(config.badges.accuracy, 90);
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[drill]\nclusters = 6\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.drill.clusters, 6);
        // Untouched sections keep defaults.
        assert_eq!(config.engine.advance_accuracy, 90);
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not [valid toml").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(KeyflowError::Config { .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = PathBuf::from("/nonexistent/keyflow/config.toml");
        assert!(matches!(
            Config::load_from(&path),
            Err(KeyflowError::Storage { .. })
        ));
    }

    #[test]
    fn test_validated_clamps_bad_band() {
        let mut config = Config::default();
        config.engine.advance_accuracy = 50;
        config.engine.retreat_accuracy = 80; // retreat above advance

        let config = config.validated();
        assert_eq!(config.engine.advance_accuracy, 90);
        assert_eq!(config.engine.retreat_accuracy, 80);
    }

    #[test]
    fn test_validated_clamps_bad_drill_values() {
        let mut config = Config::default();
        config.drill.error_rate_threshold = 7.5;
        config.drill.clusters = 0;
        config.drill.cluster_len = 0;

        let config = config.validated();
        assert_eq!(config.drill.error_rate_threshold, 0.15);
        assert_eq!(config.drill.clusters, 10);
        assert_eq!(config.drill.cluster_len, 4);
    }

    #[test]
    fn test_validated_keeps_good_values() {
        let mut config = Config::default();
        config.engine.advance_accuracy = 95;
        config.engine.retreat_accuracy = 70;
        config.drill.error_rate_threshold = 0.25;

        let config = config.clone().validated();
        assert_eq!(config.engine.advance_accuracy, 95);
        assert_eq!(config.engine.retreat_accuracy, 70);
        assert_eq!(config.drill.error_rate_threshold, 0.25);
    }

    #[test]
    #[serial]
    fn test_keyflow_home_env_override() {
        env::set_var("KEYFLOW_HOME", "/tmp/keyflow-test-home");
        assert_eq!(
            keyflow_home(),
            Some(PathBuf::from("/tmp/keyflow-test-home"))
        );
        assert_eq!(
            progress_path(),
            Some(PathBuf::from("/tmp/keyflow-test-home/progress.json"))
        );
        env::remove_var("KEYFLOW_HOME");
    }

    #[test]
    #[serial]
    fn test_keyflow_home_empty_env_falls_back() {
        env::set_var("KEYFLOW_HOME", "");
        let home = keyflow_home();
        env::remove_var("KEYFLOW_HOME");

        if let Some(home) = home {
            assert!(home.ends_with(".keyflow"));
        }
    }
}
