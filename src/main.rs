//! snap agent
//!
//! Takes webcam snapshots while a print is running, stores them as
//! public-read objects and posts each URL to a webhook. Host lifecycle
//! events are read from stdin, one event name per line.

mod config;
mod engine;
mod error;
mod events;
mod logging;
mod snapshot;
mod timer;
mod upload;
mod watcher;
mod webhook;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use config::{Config, SettingsStore};
use engine::{create_engine_channels, forward_events, EngineCommand, SnapEngine, SnapshotTick};
use timer::{ConfigInterval, TimerController};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config_override = match args.iter().position(|a| a == "--config" || a == "-c") {
        Some(i) => Some(PathBuf::from(
            args.get(i + 1).context("--config requires a path")?,
        )),
        None => None,
    };

    let _log_guard = logging::init_logging()?;

    info!("snap agent starting...");

    let config = match config_override {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    info!("Configuration loaded from {:?}", config.config_path()?);
    info!("Oh Snap! (current interval: {}s)", config.timer.interval_secs);

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(config));

    // Blocking stdin reads never return on their own
    runtime.shutdown_timeout(Duration::from_secs(1));

    if let Err(e) = &result {
        error!("snap agent failed: {:#}", e);
    }
    info!("Shutdown complete");
    result
}

async fn run(config: Config) -> Result<()> {
    let config_path = config.config_path()?;
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let settings = SettingsStore::new(config);
    let timer = TimerController::new(
        Arc::new(ConfigInterval::new(settings.clone())),
        Arc::new(SnapshotTick::new(settings.clone(), client)),
    );

    let (cmd_tx, cmd_rx, status_tx, status_rx) = create_engine_channels();

    let _watcher = match watcher::watch_settings(config_path, settings.clone(), cmd_tx.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Live settings reload disabled: {:#}", e);
            None
        }
    };

    let ctrl_c_tx = cmd_tx.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        let _ = ctrl_c_tx.blocking_send(EngineCommand::Shutdown);
    })?;

    tokio::spawn(log_status(status_rx));

    let events_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if let Err(e) = forward_events(BufReader::new(tokio::io::stdin()), events_tx).await {
            error!("Host event intake failed: {:#}", e);
        }
    });
    drop(cmd_tx);

    let mut engine = SnapEngine::new(timer, cmd_rx, status_tx);
    engine.run().await;
    Ok(())
}

async fn log_status(mut status_rx: broadcast::Receiver<engine::EngineStatus>) {
    loop {
        match status_rx.recv().await {
            Ok(status) => info!("Snapshot timer: {:?}", status),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn print_help() {
    println!("snap agent - Webcam snapshots to object storage during prints");
    println!();
    println!("USAGE:");
    println!("    snap-agent [OPTIONS] < host-events");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help           Print this help message");
    println!("    -c, --config <PATH>  Use this config file instead of the default");
    println!();
    println!("EVENTS (one per line on stdin):");
    println!("    PrintStarted, PrintResumed          start taking snapshots");
    println!("    PrintPaused, PrintDone, PrintFailed,");
    println!("    PrintCancelling, PrintCancelled     stop taking snapshots");
    println!("    SettingsUpdated                     snapshot now and re-read the interval");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG              Set log level (e.g., debug, info, warn)");
    println!("    SNAP_AGENT_LOG_PATH   Override the log directory");
}
