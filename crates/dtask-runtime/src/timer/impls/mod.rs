//! Timer backend implementations
//!
//! Currently provides:
//! - `BucketTimerBackend` - ordered map of deadline buckets

mod buckets;

pub use buckets::BucketTimerBackend;

use std::sync::Arc;

use crate::timer::TimerBackend;

/// Backend selector for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerBackendType {
    /// BTreeMap of deadline -> FIFO bucket
    ///
    /// Characteristics:
    /// - O(log n) insert
    /// - O(log n + b) cancel (b = bucket length), eager removal
    /// - O(k) detach of k due entries
    /// - O(1) peek next deadline
    #[default]
    Buckets,
}

impl TimerBackendType {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            TimerBackendType::Buckets => "buckets",
        }
    }
}

/// Create a timer backend based on type
///
/// `capacity` limits pending timers (`None` = unbounded).
pub fn create_backend(backend_type: TimerBackendType, capacity: Option<usize>) -> Arc<dyn TimerBackend> {
    match backend_type {
        TimerBackendType::Buckets => Arc::new(BucketTimerBackend::with_limit(capacity)),
    }
}
