//! Defines the event types produced by the Lava engine.
//!
//! [`NoiseLine`] is the payload of the output stream. [`EngineEvent`] is the
//! lifecycle stream that observers can subscribe to through
//! [`LavaEngine::subscribe_events`](crate::engine::LavaEngine::subscribe_events).

use crate::common::{format_noise, Cadence};
use chrono::{DateTime, Utc};
use std::fmt;

/// One emitted noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseLine {
    /// Value of the tick counter when the line was produced.
    pub tick: u64,
    /// The cadence whose timer produced the line.
    pub cadence: Cadence,
    /// The noise attached to that cadence at the time.
    pub message: String,
}

impl NoiseLine {
    pub fn new(tick: u64, cadence: Cadence, message: impl Into<String>) -> Self {
        Self {
            tick,
            cadence,
            message: message.into(),
        }
    }
}

impl fmt::Display for NoiseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_noise(self.tick, &self.message))
    }
}

/// Why the emitter stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The run budget was spent.
    BudgetExhausted,
    /// The operator cancelled the run.
    Cancelled,
    /// Nobody is listening to the line stream anymore.
    SinkClosed,
}

/// Events related to the lifecycle and state of the engine itself.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Fired once when the emitter starts ticking.
    EngineStarted { timestamp: DateTime<Utc> },
    /// Fired when the watcher decoded a changed noise mapping.
    ReloadDetected { timestamp: DateTime<Utc> },
    /// Fired when the emitter adopted a new noise for a cadence.
    OverrideApplied { cadence: Cadence, message: String },
    /// Fired once after all components have exited.
    EngineShutdown { reason: Option<ShutdownReason> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_line_displays_in_console_format() {
        let line = NoiseLine::new(60, Cadence::Minute, "RUMBLE");
        assert_eq!(line.to_string(), "60  ...  RUMBLE");
    }
}
