//! Observability hook owned by the storage adapter.

use std::time::Duration;

use tracing::{debug, warn};

/// Backend operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    /// Object write.
    Save,
    /// Object read.
    Fetch,
    /// Object removal.
    Delete,
    /// Existence probe.
    Exists,
    /// Bucket listing.
    List,
}

impl StorageOp {
    /// Stable name for logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Fetch => "fetch",
            Self::Delete => "delete",
            Self::Exists => "exists",
            Self::List => "list",
        }
    }
}

/// How an operation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Completed.
    Ok,
    /// The key did not exist.
    NotFound,
    /// Backend failure with its message.
    Failed(String),
}

/// One completed storage operation.
#[derive(Debug, Clone)]
pub struct StorageEvent {
    /// Operation kind.
    pub op: StorageOp,
    /// Provider name.
    pub provider: &'static str,
    /// Key involved, if any.
    pub key: Option<String>,
    /// Bytes moved or objects listed.
    pub size: Option<u64>,
    /// Wall time spent in the backend.
    pub elapsed: Duration,
    /// Result.
    pub outcome: EventOutcome,
}

/// Receives an event for every backend call.
pub trait StorageObserver: Send + Sync {
    /// Called once per operation, after it finishes.
    fn record(&self, event: &StorageEvent);
}

/// Default observer: one `tracing` event per operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl StorageObserver for TracingObserver {
    fn record(&self, event: &StorageEvent) {
        let key = event.key.as_deref().unwrap_or("");
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = event.elapsed.as_millis() as u64;

        match &event.outcome {
            EventOutcome::Ok => debug!(
                target: "pinboard::storage",
                op = event.op.as_str(),
                provider = event.provider,
                key,
                size = event.size,
                elapsed_ms,
                "storage operation completed"
            ),
            EventOutcome::NotFound => debug!(
                target: "pinboard::storage",
                op = event.op.as_str(),
                provider = event.provider,
                key,
                elapsed_ms,
                "storage key not found"
            ),
            EventOutcome::Failed(reason) => warn!(
                target: "pinboard::storage",
                op = event.op.as_str(),
                provider = event.provider,
                key,
                elapsed_ms,
                error = %reason,
                "storage operation failed"
            ),
        }
    }
}
