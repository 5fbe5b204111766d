//! Errors raised while running a snapshot tick

use thiserror::Error;

/// One variant per pipeline step. None of these ever stop the timer.
#[derive(Debug, Error)]
pub enum SnapError {
    #[error("could not resolve a file extension for content type {content_type:?}")]
    ExtensionResolutionFailed { content_type: Option<String> },

    #[error("failed to fetch snapshot from {url}: {reason}")]
    SnapshotFetchFailed { url: String, reason: String },

    #[error("failed to upload snapshot {key} to bucket {bucket:?}: {reason}")]
    SnapshotUploadFailed {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("failed to notify webhook {url:?}: {reason}")]
    NotifyFailed { url: String, reason: String },
}

pub type SnapResult<T> = std::result::Result<T, SnapError>;
