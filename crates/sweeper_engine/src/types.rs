use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use sweeper_core::{ContainerId, MessageId, ScanStats};

/// Error from a chat-service call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiFailure,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiFailure, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    InvalidBaseUrl,
    /// The target container does not exist or is not visible to the token.
    ContainerNotFound,
    /// The credentials were rejected.
    Unauthorized,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::InvalidBaseUrl => write!(f, "invalid base url"),
            ApiFailure::ContainerNotFound => write!(f, "container not found"),
            ApiFailure::Unauthorized => write!(f, "unauthorized"),
            ApiFailure::HttpStatus(code) => write!(f, "http status {code}"),
            ApiFailure::Timeout => write!(f, "timeout"),
            ApiFailure::Network => write!(f, "network error"),
            ApiFailure::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

/// Progress events emitted while a scan runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started {
        container: ContainerId,
        today: NaiveDate,
    },
    /// A message was classified as eligible and queued for the next flush.
    MessageQueued {
        id: MessageId,
        date: DateTime<Utc>,
        preview: String,
    },
    BatchFlushed {
        len: usize,
        dry_run: bool,
    },
    BatchFailed {
        len: usize,
        error: String,
    },
    /// Cancellation observed; the scan stops without flushing the pending
    /// partial batch.
    Cancelled,
    Finished {
        stats: ScanStats,
    },
}

/// Seam for observing scan progress.
pub trait ScanSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ScanSink for NullSink {
    fn emit(&self, _event: ScanEvent) {}
}

/// Fatal scan failures. Batch-delete failures are not represented here:
/// they are recorded in the statistics and the scan continues.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("destructive scan refused: affirmative confirmation required")]
    ConfirmationRequired,
    #[error("message source failed: {0}")]
    Source(#[from] ApiError),
}
