//! # Lavabomb
//!
//! A rumbling volcano for your terminal: three nested emission cadences with
//! noises that can be swapped at runtime by editing a JSON file.
//!
//! ## Core Concepts
//!
//! - **Cadences**: a second, a minute and an hour timer tick side by side. At the
//!   boundaries where they coincide (every 60th and 3600th second) only the
//!   coarsest cadence speaks.
//! - **Emitter**: the single owner of the current noises. It drains pending
//!   overrides without ever blocking a tick and stops once the run budget is
//!   spent.
//! - **ConfigWatcher**: polls a [`ReloadSource`](components::watcher::ReloadSource)
//!   and hands every changed noise to the emitter over a single-slot channel.
//! - **Printer**: renders the emitted lines, in order, to a
//!   [`NoiseSink`](components::sink::NoiseSink).
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use lavabomb::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Build an engine from the default settings (a 240 minute run).
//!     let engine = LavaEngine::new(LavaConfig::default())?;
//!
//!     // 2. Watch a JSON file for new noises and print to stdout.
//!     let source = FileSource::new("config.json");
//!     let sink = WriterSink::stdout(false);
//!
//!     // 3. Run until the budget is spent or the token is cancelled.
//!     let report = engine.run(source, sink, CancellationToken::new()).await?;
//!     println!("{:?}", report.reason);
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Lava Engine";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod time;

/// A prelude module for easy importing of the most common Lavabomb types.
pub mod prelude {
    pub use crate::common::{Cadence, NoiseState};
    pub use crate::components::sink::{NoiseSink, Printer, WriterSink};
    pub use crate::components::watcher::{FileSource, ReloadRecord, ReloadSource};
    pub use crate::config::{LavaConfig, ReloadFailurePolicy};
    pub use crate::engine::{LavaEngine, RunReport};
    pub use crate::error::{LavaError, Result};
    pub use crate::events::{EngineEvent, NoiseLine, ShutdownReason};
}
