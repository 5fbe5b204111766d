//! Live reload of the config file
//!
//! A changed file replaces the shared settings and is reported to the engine
//! as a `SettingsUpdated` host event.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::{Config, SettingsStore};
use crate::engine::EngineCommand;
use crate::events::HostEvent;

/// Keeps the underlying file watcher alive
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
}

/// Watch `config_path` and push changes into `settings`.
///
/// The engine is notified from the watcher's own thread, so this must not
/// be driven from inside an async task.
pub fn watch_settings(
    config_path: PathBuf,
    settings: SettingsStore,
    cmd_tx: mpsc::Sender<EngineCommand>,
) -> Result<SettingsWatcher> {
    let watch_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .context("Config file has no parent directory")?;

    let path = config_path.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !touches_config(&event, &path) {
                return;
            }
            if reload_settings(&path, &settings) {
                info!("Settings changed, notifying engine");
                if cmd_tx
                    .blocking_send(EngineCommand::HostEvent(HostEvent::SettingsUpdated))
                    .is_err()
                {
                    debug!("Engine gone, dropping settings update");
                }
            }
        }
        Err(e) => error!("Config watch error: {}", e),
    })
    .context("Failed to create config watcher")?;

    watcher
        .watch(&watch_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch config directory: {:?}", watch_dir))?;

    info!("Watching {:?} for settings changes", config_path);
    Ok(SettingsWatcher { _watcher: watcher })
}

fn touches_config(event: &Event, config_path: &Path) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == config_path.file_name())
}

/// Re-read the config file. Returns true if the settings changed.
///
/// An unreadable or invalid file leaves the current settings untouched.
pub fn reload_settings(config_path: &Path, settings: &SettingsStore) -> bool {
    match Config::parse_file(config_path) {
        Ok(config) => settings.replace(config),
        Err(e) => {
            warn!("Ignoring config change: {:#}", e);
            false
        }
    }
}
