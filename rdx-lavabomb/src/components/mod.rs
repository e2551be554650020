//! Contains the three components of a run and the channels between them.
//!
//! The [`ConfigWatcher`](watcher::ConfigWatcher) feeds overrides to the
//! [`Emitter`](emitter::Emitter), whose lines are rendered by the
//! [`Printer`](sink::Printer). The `LavaEngine` wires them together.

pub mod emitter;
pub mod sink;
pub mod watcher;

use crate::common::Cadence;
use tokio::sync::mpsc::{self, error::SendError};

/// Publishing half of the per-cadence override channels.
#[derive(Debug, Clone)]
pub struct OverrideSenders {
    second: mpsc::Sender<String>,
    minute: mpsc::Sender<String>,
    hour: mpsc::Sender<String>,
}

impl OverrideSenders {
    /// Queues `message` for `cadence`, waiting while the previous one is undrained.
    pub async fn publish(
        &self,
        cadence: Cadence,
        message: String,
    ) -> Result<(), SendError<String>> {
        let sender = match cadence {
            Cadence::Second => &self.second,
            Cadence::Minute => &self.minute,
            Cadence::Hour => &self.hour,
        };
        sender.send(message).await
    }
}

/// Draining half of the per-cadence override channels.
#[derive(Debug)]
pub struct OverrideReceivers {
    second: mpsc::Receiver<String>,
    minute: mpsc::Receiver<String>,
    hour: mpsc::Receiver<String>,
}

impl OverrideReceivers {
    /// Takes the pending override for `cadence` without waiting.
    pub fn try_take(&mut self, cadence: Cadence) -> Option<String> {
        let receiver = match cadence {
            Cadence::Second => &mut self.second,
            Cadence::Minute => &mut self.minute,
            Cadence::Hour => &mut self.hour,
        };
        receiver.try_recv().ok()
    }
}

/// Creates the three single-slot override channels.
pub fn override_channels() -> (OverrideSenders, OverrideReceivers) {
    let (second_tx, second_rx) = mpsc::channel(1);
    let (minute_tx, minute_rx) = mpsc::channel(1);
    let (hour_tx, hour_rx) = mpsc::channel(1);
    (
        OverrideSenders {
            second: second_tx,
            minute: minute_tx,
            hour: hour_tx,
        },
        OverrideReceivers {
            second: second_rx,
            minute: minute_rx,
            hour: hour_rx,
        },
    )
}
