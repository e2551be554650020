//! Watches the noise mapping and delivers changed noises to the emitter.

use crate::common::Cadence;
use crate::components::OverrideSenders;
use crate::config::ReloadFailurePolicy;
use crate::error::{LavaError, Result};
use crate::events::EngineEvent;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// A decoded snapshot of the noise mapping.
///
/// Every field is optional; an absent or empty field leaves that cadence's
/// noise unchanged. Unknown keys are ignored, but a known key holding anything
/// other than a string fails the whole decode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReloadRecord {
    #[serde(default)]
    pub second: Option<String>,
    #[serde(default)]
    pub minute: Option<String>,
    #[serde(default)]
    pub hour: Option<String>,
}

impl ReloadRecord {
    /// Decodes a JSON document.
    pub fn from_slice(content: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(content)
    }

    pub fn get(&self, cadence: Cadence) -> Option<&str> {
        let field = match cadence {
            Cadence::Second => &self.second,
            Cadence::Minute => &self.minute,
            Cadence::Hour => &self.hour,
        };
        field.as_deref().filter(|noise| !noise.is_empty())
    }

    /// The non-empty overrides, finest cadence first.
    pub fn overrides(&self) -> Vec<(Cadence, String)> {
        Cadence::ALL
            .into_iter()
            .filter_map(|cadence| self.get(cadence).map(|noise| (cadence, noise.to_string())))
            .collect()
    }
}

/// Trait for noise mapping sources.
///
/// Implement this trait to feed noises from somewhere other than a local file.
pub trait ReloadSource: Send + Sync + 'static {
    /// Returns the current mapping if it changed at or after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`LavaError::Io`] if the source cannot be read and
    /// [`LavaError::Decode`] if its content is not a valid mapping.
    fn read_if_modified(&self, since: DateTime<Utc>) -> Result<Option<ReloadRecord>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String;
}

/// JSON file source, change-detected by modification time.
///
/// # Examples
///
/// ```rust,no_run
/// use lavabomb::components::watcher::FileSource;
///
/// let source = FileSource::new("config.json");
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LavaError {
        LavaError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ReloadSource for FileSource {
    fn read_if_modified(&self, since: DateTime<Utc>) -> Result<Option<ReloadRecord>> {
        let metadata = fs::metadata(&self.path).map_err(|e| self.io_error(e))?;
        let modified: DateTime<Utc> = metadata.modified().map_err(|e| self.io_error(e))?.into();
        if modified < since {
            return Ok(None);
        }

        let content = fs::read(&self.path).map_err(|e| self.io_error(e))?;
        let record = ReloadRecord::from_slice(&content).map_err(|source| LavaError::Decode {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(record))
    }

    fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Polls a [`ReloadSource`] and publishes every changed noise once.
pub struct ConfigWatcher<S> {
    source: S,
    last_checked: DateTime<Utc>,
    poll_interval: Duration,
    policy: ReloadFailurePolicy,
    overrides: OverrideSenders,
    failures: mpsc::Sender<LavaError>,
    done: CancellationToken,
    events: Option<broadcast::Sender<EngineEvent>>,
}

impl<S: ReloadSource> ConfigWatcher<S> {
    /// Creates a watcher that considers changes from now on.
    ///
    /// `done` is cancelled by the emitter when it stops; the watcher then exits.
    pub fn new(
        source: S,
        overrides: OverrideSenders,
        failures: mpsc::Sender<LavaError>,
        done: CancellationToken,
    ) -> Self {
        Self {
            source,
            last_checked: Utc::now(),
            poll_interval: Duration::from_secs(1),
            policy: ReloadFailurePolicy::default(),
            overrides,
            failures,
            done,
            events: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_policy(mut self, policy: ReloadFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Overrides the timestamp the first poll compares against.
    pub fn with_last_checked(mut self, last_checked: DateTime<Utc>) -> Self {
        self.last_checked = last_checked;
        self
    }

    pub fn with_events(mut self, events: broadcast::Sender<EngineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn last_checked(&self) -> DateTime<Utc> {
        self.last_checked
    }

    /// Checks the source once.
    ///
    /// On success `last_checked` advances to the moment this check started,
    /// so a mapping is reported once per modification.
    pub fn poll_once(&mut self) -> Result<Option<ReloadRecord>> {
        let checked_at = Utc::now();
        let record = self.source.read_if_modified(self.last_checked)?;
        self.last_checked = checked_at;
        Ok(record)
    }

    /// Publishes the non-empty fields of `record`.
    ///
    /// Returns the number of overrides queued, or `None` once the emitter has
    /// dropped its receivers.
    pub async fn publish(&self, record: &ReloadRecord) -> Option<usize> {
        let overrides = record.overrides();
        let count = overrides.len();
        for (cadence, noise) in overrides {
            debug!("Publishing {} override {:?}", cadence, noise);
            if self.overrides.publish(cadence, noise).await.is_err() {
                return None;
            }
        }
        Some(count)
    }

    /// Polls until the emitter finishes or a reload fails under `Abort`.
    ///
    /// Returns the number of changed mappings that were published.
    pub async fn run(mut self) -> usize {
        info!(
            "Watching {} every {:?}.",
            self.source.name(),
            self.poll_interval
        );
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut reloads = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.done.cancelled() => break,
                _ = poll.tick() => {}
            }

            match self.poll_once() {
                Ok(Some(record)) => {
                    info!("Noise mapping {} changed.", self.source.name());
                    if let Some(events) = &self.events {
                        events
                            .send(EngineEvent::ReloadDetected {
                                timestamp: self.last_checked,
                            })
                            .ok();
                    }
                    if self.publish(&record).await.is_none() {
                        break;
                    }
                    reloads += 1;
                }
                Ok(None) => trace!("No change in {}.", self.source.name()),
                Err(err) => match self.policy {
                    ReloadFailurePolicy::Abort => {
                        error!("Reload failed, stopping the run: {}", err);
                        self.failures.send(err).await.ok();
                        break;
                    }
                    ReloadFailurePolicy::Skip => {
                        warn!("Reload failed, keeping current noises: {}", err);
                    }
                },
            }
        }

        debug!("ConfigWatcher stopped after {} reloads.", reloads);
        reloads
    }
}
