//! The emitter: ticks the three cadences and produces the line stream.

use crate::common::{Cadence, NoiseState, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use crate::components::OverrideReceivers;
use crate::error::{LavaError, Result};
use crate::events::{EngineEvent, NoiseLine, ShutdownReason};
use crate::time::{Beat, CadenceClock};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

/// Drives the cadence timers and owns the current noises.
///
/// The emitter is the only component allowed to change [`NoiseState`]; it
/// adopts overrides by draining its [`OverrideReceivers`] without ever waiting
/// on them. Its line sender is dropped when [`Emitter::run`] returns, which
/// closes the stream for the printer.
pub struct Emitter {
    budget: Duration,
    state: NoiseState,
    counter: u64,
    overrides: OverrideReceivers,
    failures: mpsc::Receiver<LavaError>,
    output: mpsc::Sender<NoiseLine>,
    cancel: CancellationToken,
    done: CancellationToken,
    events: Option<broadcast::Sender<EngineEvent>>,
}

impl Emitter {
    pub fn new(
        budget: Duration,
        overrides: OverrideReceivers,
        failures: mpsc::Receiver<LavaError>,
        output: mpsc::Sender<NoiseLine>,
    ) -> Self {
        Self {
            budget,
            state: NoiseState::default(),
            counter: 0,
            overrides,
            failures,
            output,
            cancel: CancellationToken::new(),
            done: CancellationToken::new(),
            events: None,
        }
    }

    /// Stops the run early once `cancel` is cancelled.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancels `done` when the run ends, for whatever reason.
    pub fn with_done(mut self, done: CancellationToken) -> Self {
        self.done = done;
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<EngineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Ticks until the budget is spent, the run is cancelled, the line stream
    /// is closed or the watcher reports a failure.
    ///
    /// # Errors
    ///
    /// Returns the failure forwarded by the watcher.
    pub async fn run(mut self) -> Result<ShutdownReason> {
        let _done = self.done.clone().drop_guard();
        let mut clock = CadenceClock::start(self.budget);
        info!("Emitter rumbling for {:?}.", self.budget);

        let outcome = self.tick_loop(&mut clock).await;
        match &outcome {
            Ok(reason) => info!("Emitter stopped: {:?}.", reason),
            Err(err) => info!("Emitter stopped by failure: {}", err),
        }
        outcome
    }

    async fn tick_loop(&mut self, clock: &mut CadenceClock) -> Result<ShutdownReason> {
        loop {
            for cadence in Cadence::ALL {
                self.drain(cadence);
            }

            let beat = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(ShutdownReason::Cancelled),
                Some(err) = self.failures.recv() => return Err(err),
                beat = clock.next() => beat,
            };

            let cadence = match beat {
                Beat::BudgetSpent => return Ok(ShutdownReason::BudgetExhausted),
                Beat::Tick { cadence, .. } => cadence,
            };

            if let Some(line) = self.on_tick(cadence) {
                trace!("Tick #{} ({}) emits.", line.tick, cadence);
                if self.output.send(line).await.is_err() {
                    return Ok(ShutdownReason::SinkClosed);
                }
            }
        }
    }

    /// Advances the counter for one timer fire and returns the line to emit.
    ///
    /// A second tick landing on a minute boundary, and a minute tick landing on
    /// an hour boundary, stay silent: the coarser cadence speaks for them.
    fn on_tick(&mut self, cadence: Cadence) -> Option<NoiseLine> {
        self.drain(cadence);
        match cadence {
            Cadence::Second => {
                self.counter += 1;
                (self.counter % SECONDS_PER_MINUTE != 0).then(|| self.line(cadence))
            }
            Cadence::Minute => (self.counter % SECONDS_PER_HOUR != 0).then(|| self.line(cadence)),
            Cadence::Hour => {
                let line = self.line(cadence);
                self.counter = 0;
                Some(line)
            }
        }
    }

    fn line(&self, cadence: Cadence) -> NoiseLine {
        NoiseLine::new(self.counter, cadence, self.state.get(cadence))
    }

    fn drain(&mut self, cadence: Cadence) {
        if let Some(message) = self.overrides.try_take(cadence) {
            debug!("{} noise is now {:?}.", cadence, message);
            if let Some(events) = &self.events {
                events
                    .send(EngineEvent::OverrideApplied {
                        cadence,
                        message: message.clone(),
                    })
                    .ok();
            }
            self.state.apply(cadence, message);
        }
    }
}
