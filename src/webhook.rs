//! Webhook notification carrying the published snapshot URL

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WebhookConfig;
use crate::error::{SnapError, SnapResult};

/// JSON body posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    value1: &'a str,
    value2: &'a str,
    value3: &'a str,
}

#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Post the snapshot URL to the configured webhook.
    ///
    /// Only transport errors fail; a non-2xx answer is logged and accepted.
    pub async fn notify(&self, webhook: &WebhookConfig, snapshot_url: &str) -> SnapResult<()> {
        let payload = WebhookPayload {
            value1: &webhook.value1,
            value2: &webhook.value2,
            value3: snapshot_url,
        };

        let response = self
            .client
            .post(&webhook.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SnapError::NotifyFailed {
                url: webhook.url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!("Webhook accepted snapshot {} ({})", snapshot_url, status);
        } else {
            warn!("Webhook {} answered {}", webhook.url, status);
        }

        Ok(())
    }
}
