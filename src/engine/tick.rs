//! The snapshot-then-notify tick

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::SettingsStore;
use crate::error::SnapResult;
use crate::snapshot::SnapshotPipeline;
use crate::timer::TickAction;
use crate::webhook::WebhookNotifier;

/// Captures a snapshot with the current settings and reports its URL
pub struct SnapshotTick {
    settings: SettingsStore,
    pipeline: SnapshotPipeline,
    notifier: WebhookNotifier,
}

impl SnapshotTick {
    pub fn new(settings: SettingsStore, client: Client) -> Self {
        Self {
            settings,
            pipeline: SnapshotPipeline::new(client.clone()),
            notifier: WebhookNotifier::new(client),
        }
    }
}

#[async_trait]
impl TickAction for SnapshotTick {
    async fn tick(&self) -> SnapResult<String> {
        let config = self.settings.current();
        debug!("Taking snapshot from {}", config.webcam.snapshot_url);

        let url = self
            .pipeline
            .capture_and_store(&config.webcam.snapshot_url, &config.storage)
            .await?;

        self.notifier.notify(&config.webhook, &url).await?;
        Ok(url)
    }
}
