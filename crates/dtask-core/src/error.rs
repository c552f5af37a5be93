//! Error types for the dtask scheduler

use std::time::Duration;
use thiserror::Error;

/// Result type for scheduler operations
pub type DTaskResult<T> = Result<T, DTaskError>;

/// Errors that can occur in scheduler operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DTaskError {
    /// Work queue at capacity; `waited` is zero for fail-fast rejections
    #[error("work queue full (capacity {capacity}, waited {waited:?})")]
    QueueFull { capacity: usize, waited: Duration },

    /// A deferred callback or work item panicked
    #[error("callback failed: {message}")]
    CallbackFailed { message: String },

    /// Pending timer limit reached
    #[error("timer capacity reached (limit {limit})")]
    TimerCapacity { limit: usize },

    /// Item was cancelled before it started
    #[error("task cancelled")]
    Cancelled,

    /// Scheduler (or one of its parts) is shut down
    #[error("scheduler shut down")]
    ShutDown,

    /// Configuration rejected by `validate()`
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to spawn a background thread
    #[error("failed to spawn thread: {0}")]
    Spawn(String),
}

impl DTaskError {
    /// True for errors caused by a saturated bounded resource
    #[inline]
    pub fn is_backpressure(&self) -> bool {
        matches!(self, DTaskError::QueueFull { .. } | DTaskError::TimerCapacity { .. })
    }
}

impl From<std::io::Error> for DTaskError {
    fn from(e: std::io::Error) -> Self {
        DTaskError::Spawn(e.to_string())
    }
}
