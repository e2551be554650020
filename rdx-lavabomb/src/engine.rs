//! The core engine that wires and runs the three components.

use crate::components::emitter::Emitter;
use crate::components::override_channels;
use crate::components::sink::{NoiseSink, Printer};
use crate::components::watcher::{ConfigWatcher, ReloadSource};
use crate::config::LavaConfig;
use crate::error::{LavaError, Result};
use crate::events::{EngineEvent, ShutdownReason};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The outcome of a run that ended without a failure.
#[derive(Debug)]
pub struct RunReport<S> {
    pub reason: ShutdownReason,
    /// Changed mappings picked up by the watcher.
    pub reloads: usize,
    /// Lines the sink rendered.
    pub rendered: usize,
    /// Lines the sink failed to render.
    pub render_failures: usize,
    /// The sink, handed back after the stream closed.
    pub sink: S,
}

/// The main Lava engine.
///
/// Holds the validated settings and the lifecycle event channel. Each call to
/// [`LavaEngine::run`] spawns a fresh emitter, watcher and printer and waits
/// for all three to exit.
#[derive(Clone)]
pub struct LavaEngine {
    config: Arc<LavaConfig>,
    event_sender: broadcast::Sender<EngineEvent>,
}

impl LavaEngine {
    /// Creates a new `LavaEngine`, rejecting unusable settings up front.
    ///
    /// # Errors
    ///
    /// Returns [`LavaError::Construction`](crate::error::LavaError::Construction)
    /// for a zero run budget, poll interval or output capacity.
    pub fn new(config: LavaConfig) -> Result<Self> {
        config.validate()?;
        let (event_sender, _) = broadcast::channel(64);
        Ok(Self {
            config: Arc::new(config),
            event_sender,
        })
    }

    pub fn config(&self) -> &LavaConfig {
        &self.config
    }

    /// Subscribes to the `EngineEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_sender.subscribe()
    }

    /// Runs one eruption until the budget is spent, `cancel` fires or the
    /// watcher reports a failure.
    ///
    /// This method will:
    /// 1. Spawn the emitter, the watcher over `source` and the printer over `sink`.
    /// 2. Wait for all three to exit.
    /// 3. Surface the watcher's failure, if the run was ended by one.
    pub async fn run<R, S>(
        &self,
        source: R,
        sink: S,
        cancel: CancellationToken,
    ) -> Result<RunReport<S>>
    where
        R: ReloadSource,
        S: NoiseSink,
    {
        info!("LavaEngine starting up...");
        let (override_tx, override_rx) = override_channels();
        let (failure_tx, failure_rx) = mpsc::channel(1);
        let (line_tx, line_rx) = mpsc::channel(self.config.output_capacity);
        let done = cancel.child_token();

        let emitter = Emitter::new(self.config.run_budget(), override_rx, failure_rx, line_tx)
            .with_cancel(cancel)
            .with_done(done.clone())
            .with_events(self.event_sender.clone());
        let watcher = ConfigWatcher::new(source, override_tx, failure_tx, done)
            .with_poll_interval(self.config.poll_interval())
            .with_policy(self.config.reload_failure)
            .with_events(self.event_sender.clone());
        let printer = Printer::new(sink);

        self.event_sender
            .send(EngineEvent::EngineStarted {
                timestamp: Utc::now(),
            })
            .ok();
        let emitter_handle = tokio::spawn(emitter.run());
        let watcher_handle = tokio::spawn(watcher.run());
        let printer_handle = tokio::spawn(printer.run(line_rx));

        let (emitted, reloads, printed) =
            tokio::join!(emitter_handle, watcher_handle, printer_handle);

        let outcome = emitted.map_err(LavaError::from).and_then(|result| result);
        self.event_sender
            .send(EngineEvent::EngineShutdown {
                reason: outcome.as_ref().ok().copied(),
            })
            .ok();

        let reason = match outcome {
            Ok(reason) => reason,
            Err(err) => {
                error!("Eruption failed: {}", err);
                return Err(err);
            }
        };
        let printed = printed?;
        let reloads = reloads?;
        info!("volcano finished rumbling ...");

        Ok(RunReport {
            reason,
            reloads,
            rendered: printed.rendered,
            render_failures: printed.failed,
            sink: printed.sink,
        })
    }
}
