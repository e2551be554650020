use anyhow::Result;
use clap::Parser;
use lavabomb::prelude::*;
use lavabomb::{ENGINE_NAME, VERSION};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Lavabomb - a volcano that rumbles every second, minute and hour
#[derive(Parser)]
#[command(name = "lavabomb")]
#[command(version)]
#[command(about = "A volcano that rumbles every second, minute and hour", long_about = None)]
struct Cli {
    /// Path of a json file through which volcano noises can be dynamically changed
    #[arg(long, short = 'f', default_value = "config.json")]
    file: PathBuf,

    /// Engine settings file (run budget, poll interval, reload policy)
    #[arg(long, short = 's', default_value = "lavabomb.toml")]
    settings: PathBuf,

    /// Highlight minute and hour noises
    #[arg(long)]
    color: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize structured logging; stdout is reserved for the noises.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // 2. Load settings and build the engine. Bad settings stop us here.
    let config = LavaConfig::load(Some(&cli.settings))?;
    let engine = LavaEngine::new(config)?;
    info!(
        "{} v{} erupting for {:?}, noises from {}.",
        ENGINE_NAME,
        VERSION,
        engine.config().run_budget(),
        cli.file.display()
    );

    // 3. Log lifecycle events and stop early on Ctrl+C.
    spawn_event_listener(&engine);
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    // 4. Run the engine.
    let report = engine
        .run(
            FileSource::new(&cli.file),
            WriterSink::stdout(cli.color),
            cancel,
        )
        .await?;

    info!(
        "Stopped ({:?}) after {} lines and {} reloads.",
        report.reason, report.rendered, report.reloads
    );
    if report.render_failures > 0 {
        warn!("{} lines could not be printed.", report.render_failures);
    }
    Ok(())
}

fn spawn_event_listener(engine: &LavaEngine) {
    let mut events = engine.subscribe_events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!("[ENGINE] => {:?}", event);
        }
    });
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received. Stopping the eruption...");
                cancel.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
        }
    });
}
