//! Logging setup
//!
//! Human-readable output goes to stderr for whatever process or journal
//! launched the agent. A daily rolling file without ANSI colors goes to the
//! per-user log directory (override with `SNAP_AGENT_LOG_PATH`), and files
//! older than seven days are pruned at startup.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_BASENAME: &str = "snap-agent.log";
const LOG_DIR_ENV: &str = "SNAP_AGENT_LOG_PATH";
const LOG_RETENTION_DAYS: u64 = 7;

/// Subsystem for macOS unified logging (os_log).
#[cfg(target_os = "macos")]
const OSLOG_SUBSYSTEM: &str = "dev.snap-agent.agent";

/// Log to stderr and a daily rolling file. Keep the guard alive until exit.
pub fn init_logging() -> Result<WorkerGuard> {
    let log_dir = resolve_log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;

    prune_old_logs(
        &log_dir,
        Duration::from_secs(60 * 60 * 24 * LOG_RETENTION_DAYS),
    );

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_BASENAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    #[cfg(target_os = "macos")]
    {
        let oslog_layer = tracing_oslog::OsLogger::new(OSLOG_SUBSYSTEM, "default");

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .with(oslog_layer)
            .init();
    }

    #[cfg(not(target_os = "macos"))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    }

    Ok(guard)
}

fn resolve_log_dir() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var(LOG_DIR_ENV) {
        return Ok(PathBuf::from(override_path));
    }

    let proj_dirs = ProjectDirs::from("dev", "snap-agent", "agent")
        .context("Failed to determine project directories for log path")?;

    #[cfg(target_os = "linux")]
    {
        let base = proj_dirs
            .state_dir()
            .unwrap_or_else(|| proj_dirs.data_local_dir());
        return Ok(base.join("logs"));
    }

    #[cfg(not(target_os = "linux"))]
    {
        return Ok(proj_dirs.data_local_dir().join("logs"));
    }
}

fn prune_old_logs(log_dir: &Path, max_age: Duration) {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return;
    };

    let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };

        if !file_name.starts_with(LOG_FILE_BASENAME) {
            continue;
        }

        let Ok(modified) = entry.metadata().and_then(|m| m.modified()) else {
            continue;
        };

        if modified < cutoff {
            let _ = std::fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_recent_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join(format!("{}.2026-10-19", LOG_FILE_BASENAME));
        let other = dir.path().join("notes.txt");
        std::fs::write(&log, "recent").unwrap();
        std::fs::write(&other, "keep").unwrap();

        prune_old_logs(dir.path(), Duration::from_secs(60 * 60));
        assert!(log.exists());
        assert!(other.exists());

        // Everything counts as old with a zero retention window
        std::thread::sleep(Duration::from_millis(20));
        prune_old_logs(dir.path(), Duration::ZERO);
        assert!(!log.exists());
        assert!(other.exists());
    }
}
