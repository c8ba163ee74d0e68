//! Error types for the isoAutomate runtime.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while acquiring, driving, or releasing a remote
/// browser.
#[derive(Debug, Error)]
pub enum Error {
    /// The worker pool set is empty - no worker has registered at all.
    #[error("No workers registered in the pool. Check that workers are running.")]
    NoWorkers,

    /// Workers exist but none had a free instance of the requested type.
    #[error("No browsers available for type '{browser_type}'. Check workers.")]
    NoBrowserAvailable {
        /// Browser engine that was requested.
        browser_type: String,
    },

    /// An action was attempted without a live session.
    #[error("Cannot perform action '{action}': browser session not acquired")]
    NotAcquired {
        /// The action that was attempted.
        action: String,
    },

    /// Acquire was called while a session is already live on this client.
    #[error("A browser session is already acquired; release it first")]
    SessionBusy,

    /// Store connectivity failure that persisted past the retry budget.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No worker answered within the caller's deadline. Distinct from
    /// [`Error::Transport`]: the task may still be running remotely.
    #[error("Timeout waiting for worker response to '{action}' after {timeout:?}")]
    Timeout {
        /// The action that went unanswered.
        action: String,
        /// The deadline that expired.
        timeout: Duration,
    },

    /// Malformed worker response - a version/schema mismatch with the
    /// remote side.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Underlying Redis error.
    #[error("Store error: {0}")]
    Store(#[from] redis::RedisError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if no browser could be allocated (empty pool or no free
    /// instance), i.e. the caller may retry acquisition after backoff.
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(self, Error::NoWorkers | Error::NoBrowserAvailable { .. })
    }
}
