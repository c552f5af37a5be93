//! Library defaults for `SchedulerConfig`
//!
//! Overridden at runtime by the `DTASK_*` environment variables.

use std::time::Duration;

/// Worker threads; `0` means "one per available CPU"
pub const NUM_WORKERS: usize = 0;

/// Bounded work queue capacity
pub const QUEUE_CAPACITY: usize = 1024;

/// Pending timer limit; `0` means unbounded
pub const MAX_PENDING_TIMERS: usize = 0;

/// Longest single park of the poller before it rescans
pub const MAX_PARK: Duration = Duration::from_millis(1000);

/// Prefix for background thread names
pub const THREAD_PREFIX: &str = "dtask";

/// Fallback worker count when CPU count is unavailable
pub const FALLBACK_WORKERS: usize = 4;
