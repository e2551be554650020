//! Contains the primitive types shared by every component.
//!
//! A [`Cadence`] names one of the three timing tiers, and [`NoiseState`] holds
//! the message currently attached to each of them.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default noise for the second cadence.
pub const SECOND_NOISE: &str = "rumble";
/// Default noise for the minute cadence.
pub const MINUTE_NOISE: &str = "RUMBLE";
/// Default noise for the hour cadence.
pub const HOUR_NOISE: &str = "LAVAOVERFLOW";

/// Seconds in one minute-cadence period.
pub const SECONDS_PER_MINUTE: u64 = 60;
/// Seconds in one hour-cadence period.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// One of the three independent timing tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Second,
    Minute,
    Hour,
}

impl Cadence {
    /// All cadences, finest first.
    pub const ALL: [Cadence; 3] = [Cadence::Second, Cadence::Minute, Cadence::Hour];

    /// The interval between two ticks of this cadence.
    pub fn period(self) -> Duration {
        match self {
            Cadence::Second => Duration::from_secs(1),
            Cadence::Minute => Duration::from_secs(SECONDS_PER_MINUTE),
            Cadence::Hour => Duration::from_secs(SECONDS_PER_HOUR),
        }
    }

    /// The built-in noise used until an override arrives.
    pub fn default_noise(self) -> &'static str {
        match self {
            Cadence::Second => SECOND_NOISE,
            Cadence::Minute => MINUTE_NOISE,
            Cadence::Hour => HOUR_NOISE,
        }
    }

    /// The key this cadence is stored under in the noise mapping.
    pub fn key(self) -> &'static str {
        match self {
            Cadence::Second => "second",
            Cadence::Minute => "minute",
            Cadence::Hour => "hour",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The message currently attached to each cadence.
///
/// Owned by the emitter for the duration of one run. It only changes through
/// [`NoiseState::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseState {
    second: String,
    minute: String,
    hour: String,
}

impl Default for NoiseState {
    fn default() -> Self {
        Self {
            second: SECOND_NOISE.to_string(),
            minute: MINUTE_NOISE.to_string(),
            hour: HOUR_NOISE.to_string(),
        }
    }
}

impl NoiseState {
    /// Returns the noise for `cadence`.
    pub fn get(&self, cadence: Cadence) -> &str {
        match cadence {
            Cadence::Second => &self.second,
            Cadence::Minute => &self.minute,
            Cadence::Hour => &self.hour,
        }
    }

    /// Replaces the noise for `cadence`.
    pub fn apply(&mut self, cadence: Cadence, message: String) {
        let slot = match cadence {
            Cadence::Second => &mut self.second,
            Cadence::Minute => &mut self.minute,
            Cadence::Hour => &mut self.hour,
        };
        *slot = message;
    }
}

/// Renders one output line: `"<tick>  ...  <message>"`.
pub fn format_noise(tick: u64, message: &str) -> String {
    format!("{}  ...  {}", tick, message)
}
