//! Defines the configuration structures for the Lava engine.
//!
//! The engine settings are deserialized with `serde` from an optional settings
//! file (TOML, JSON or YAML, picked by extension) and then overridden by
//! `LAVABOMB_*` environment variables. The noise mapping itself is not part of
//! these settings; it is owned by the
//! [`ConfigWatcher`](crate::components::watcher::ConfigWatcher).

use crate::error::{LavaError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for engine settings.
pub const ENV_PREFIX: &str = "LAVABOMB";

/// The top-level configuration for the `LavaEngine`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LavaConfig {
    /// Total wall-clock duration of one run, in seconds.
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,

    /// How often the noise mapping is checked for changes, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Capacity of the line stream between the emitter and the printer.
    #[serde(default = "default_output_capacity")]
    pub output_capacity: usize,

    /// What a failed reload does to the run.
    #[serde(default)]
    pub reload_failure: ReloadFailurePolicy,
}

/// Reaction of the watcher to an unreadable or malformed noise mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadFailurePolicy {
    /// Forward the error to the emitter and end the run.
    #[default]
    Abort,
    /// Log the error, keep the current noises and poll again next cycle.
    Skip,
}

// --- Default value functions for serde ---

fn default_run_budget_secs() -> u64 {
    240 * 60
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_output_capacity() -> usize {
    16
}

impl Default for LavaConfig {
    fn default() -> Self {
        Self {
            run_budget_secs: default_run_budget_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            output_capacity: default_output_capacity(),
            reload_failure: ReloadFailurePolicy::default(),
        }
    }
}

impl LavaConfig {
    /// Loads settings from `settings` (if it exists) and the environment.
    pub fn load(settings: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = settings {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Returns a copy with the given run budget, rounded down to whole seconds.
    pub fn with_run_budget(mut self, budget: Duration) -> Self {
        self.run_budget_secs = budget.as_secs();
        self
    }

    /// Returns a copy with the given poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Returns a copy with the given reload failure policy.
    pub fn with_reload_failure(mut self, policy: ReloadFailurePolicy) -> Self {
        self.reload_failure = policy;
        self
    }

    pub fn run_budget(&self) -> Duration {
        Duration::from_secs(self.run_budget_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.run_budget_secs == 0 {
            return Err(LavaError::construction("No run budget provided"));
        }
        if self.poll_interval_ms == 0 {
            return Err(LavaError::construction("Poll interval must be non-zero"));
        }
        if self.output_capacity == 0 {
            return Err(LavaError::construction("Output capacity must be non-zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_runs_for_240_minutes() {
        let config = LavaConfig::default();
        assert_eq!(config.run_budget(), Duration::from_secs(240 * 60));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.reload_failure, ReloadFailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_budget_is_rejected() {
        let config = LavaConfig::default().with_run_budget(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(LavaError::Construction(_))
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let config = LavaConfig::default().with_poll_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_partial_toml_file() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("lavabomb.toml");
        fs::write(
            &settings_path,
            r#"
run_budget_secs = 61
reload_failure = "skip"
"#,
        )
        .unwrap();

        let config = LavaConfig::load(Some(&settings_path)).unwrap();
        assert_eq!(config.run_budget_secs, 61);
        assert_eq!(config.reload_failure, ReloadFailurePolicy::Skip);
        assert_eq!(config.poll_interval_ms, 1000);
    }

    #[test]
    fn missing_settings_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings_path = temp_dir.path().join("absent.toml");

        let config = LavaConfig::load(Some(&settings_path)).unwrap();
        assert_eq!(config.output_capacity, 16);
    }
}
