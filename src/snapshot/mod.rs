//! Snapshot pipeline
//!
//! Fetches one still from the webcam, names it after the current UTC time
//! and stores it as a public-read object.

mod extension;

pub use extension::extension_for;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::config::StorageConfig;
use crate::error::{SnapError, SnapResult};
use crate::upload::{public_url, S3Client};

/// Timestamp format of object keys. Second granularity: two snapshots taken
/// within the same second share a key and the later upload replaces the first.
const KEY_TIME_FORMAT: &str = "%m-%d-%Y_%H:%M:%S";

/// Largest snapshot body accepted from the webcam
pub const MAX_SNAPSHOT_BYTES: usize = 32 * 1024 * 1024;

/// Upper bound on the buffer reserved up front from a declared length
const INITIAL_BUFFER_BYTES: usize = 1024 * 1024;

/// Object key for a snapshot taken at `time`
pub fn object_key(time: &DateTime<Utc>, extension: &str) -> String {
    format!("{}{}", time.format(KEY_TIME_FORMAT), extension)
}

/// Fetch-and-store pipeline for a single snapshot
#[derive(Clone)]
pub struct SnapshotPipeline {
    client: Client,
    storage: S3Client,
    max_bytes: usize,
}

impl SnapshotPipeline {
    pub fn new(client: Client) -> Self {
        Self {
            storage: S3Client::new(client.clone()),
            client,
            max_bytes: MAX_SNAPSHOT_BYTES,
        }
    }

    #[cfg(test)]
    fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Capture one snapshot and return its public URL
    pub async fn capture_and_store(
        &self,
        snapshot_url: &str,
        storage: &StorageConfig,
    ) -> SnapResult<String> {
        let content_type = self.head_content_type(snapshot_url).await?;
        let extension = content_type.as_deref().and_then(extension_for);
        let (Some(content_type), Some(extension)) = (content_type.clone(), extension) else {
            return Err(SnapError::ExtensionResolutionFailed { content_type });
        };

        let key = object_key(&Utc::now(), extension);
        let body = self.fetch(snapshot_url).await?;
        debug!("Fetched snapshot {} ({} bytes)", key, body.len());

        self.storage
            .put_public_object(storage, &key, body, &content_type)
            .await?;

        Ok(public_url(
            &storage.bucket_name,
            &storage.public_domain,
            &key,
        ))
    }

    /// HEAD the snapshot source and read its content type
    async fn head_content_type(&self, snapshot_url: &str) -> SnapResult<Option<String>> {
        let response = self
            .client
            .head(snapshot_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_failed(snapshot_url, e))?;

        Ok(response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string))
    }

    /// Stream the snapshot body into memory
    async fn fetch(&self, snapshot_url: &str) -> SnapResult<Vec<u8>> {
        let response = self
            .client
            .get(snapshot_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_failed(snapshot_url, e))?;

        let declared = response.content_length().unwrap_or(0);
        if declared > self.max_bytes as u64 {
            return Err(too_large(snapshot_url, declared, self.max_bytes));
        }

        let mut body = Vec::with_capacity((declared as usize).min(INITIAL_BUFFER_BYTES));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| fetch_failed(snapshot_url, e))?;
            let received = body.len() + chunk.len();
            if received > self.max_bytes {
                return Err(too_large(snapshot_url, received as u64, self.max_bytes));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

fn fetch_failed(url: &str, e: reqwest::Error) -> SnapError {
    SnapError::SnapshotFetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

fn too_large(url: &str, size: u64, max_bytes: usize) -> SnapError {
    SnapError::SnapshotFetchFailed {
        url: url.to_string(),
        reason: format!("snapshot of {} bytes exceeds the {} byte limit", size, max_bytes),
    }
}
