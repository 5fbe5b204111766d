//! Configuration management for the snap agent

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot timer configuration
    #[serde(default)]
    pub timer: TimerConfig,

    /// Object storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook configuration
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Webcam configuration
    #[serde(default)]
    pub webcam: WebcamConfig,

    /// Outbound HTTP configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Seconds between snapshots while printing. 0 disables the timer.
    #[serde(default)]
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Access key ID used to sign uploads
    #[serde(default)]
    pub access_key_id: String,

    /// Secret access key used to sign uploads
    #[serde(default)]
    pub secret_access_key: String,

    /// Bucket that receives the snapshots
    #[serde(default)]
    pub bucket_name: String,

    /// Signing region
    #[serde(default = "default_region")]
    pub region: String,

    /// Domain used to build public object URLs (`https://<bucket>.<domain>/<key>`)
    #[serde(default = "default_public_domain")]
    pub public_domain: String,

    /// Endpoint override for S3-compatible services (path-style addressing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// URL that receives the snapshot notification
    #[serde(default)]
    pub url: String,

    /// First payload field
    #[serde(default = "default_value1")]
    pub value1: String,

    /// Second payload field
    #[serde(default = "default_value2")]
    pub value2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebcamConfig {
    /// URL returning a single still image
    #[serde(default = "default_snapshot_url")]
    pub snapshot_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_public_domain() -> String {
    "s3.amazonaws.com".to_string()
}

fn default_value1() -> String {
    "this is value_1".to_string()
}

fn default_value2() -> String {
    "this is value_2".to_string()
}

fn default_snapshot_url() -> String {
    "http://127.0.0.1:8080/?action=snapshot".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket_name: String::new(),
            region: default_region(),
            public_domain: default_public_domain(),
            endpoint: None,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            value1: default_value1(),
            value2: default_value2(),
        }
    }
}

impl Default for WebcamConfig {
    fn default() -> Self {
        Self {
            snapshot_url: default_snapshot_url(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            storage: StorageConfig::default(),
            webhook: WebhookConfig::default(),
            webcam: WebcamConfig::default(),
            http: HttpConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_config_path()?)
    }

    /// Load configuration from `config_path`, writing defaults if the file is missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let mut config = Self::parse_file(config_path)?;
            config.config_path = Some(config_path.to_path_buf());
            Ok(config)
        } else {
            let config = Config {
                config_path: Some(config_path.to_path_buf()),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Parse a config file without touching the filesystem otherwise
    pub fn parse_file(config_path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        config.config_path = Some(config_path.to_path_buf());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    /// Get default config path
    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "snap-agent", "agent")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Snapshot period, or `None` when the timer is disabled
    pub fn interval(&self) -> Option<Duration> {
        match self.timer.interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Timeout for outbound HTTP calls
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }
}

/// Shared, read-mostly handle to the live configuration
#[derive(Debug, Clone)]
pub struct SettingsStore {
    inner: Arc<RwLock<Config>>,
}

impl SettingsStore {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Fresh copy of the current settings
    pub fn current(&self) -> Config {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the settings. Returns true if anything changed.
    pub fn replace(&self, config: Config) -> bool {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard == config {
            return false;
        }
        *guard = config;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plugin_defaults() {
        let config = Config::default();
        assert_eq!(config.timer.interval_secs, 0);
        assert!(config.interval().is_none());
        assert!(config.storage.access_key_id.is_empty());
        assert!(config.storage.secret_access_key.is_empty());
        assert!(config.storage.bucket_name.is_empty());
        assert!(config.webhook.url.is_empty());
        assert_eq!(config.webhook.value1, "this is value_1");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [timer]
            interval_secs = 15

            [storage]
            bucket_name = "prints"
            "#,
        )
        .unwrap();

        assert_eq!(config.interval(), Some(Duration::from_secs(15)));
        assert_eq!(config.storage.bucket_name, "prints");
        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.storage.public_domain, "s3.amazonaws.com");
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_load_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.config_path().unwrap(), path);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_save_round_trips_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_from(&path).unwrap();
        config.timer.interval_secs = 42;
        config.storage.endpoint = Some("http://localhost:9000".to_string());
        config.save().unwrap();

        let reloaded = Config::parse_file(&path).unwrap();
        assert_eq!(reloaded.timer.interval_secs, 42);
        assert_eq!(reloaded.storage.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_store_replace_reports_changes() {
        let store = SettingsStore::new(Config::default());
        assert!(!store.replace(Config::default()));

        let mut updated = Config::default();
        updated.timer.interval_secs = 5;
        assert!(store.replace(updated));
        assert_eq!(store.current().timer.interval_secs, 5);
    }
}
