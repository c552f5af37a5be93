//! Timer subsystem for the dtask runtime
//!
//! Deferred callbacks are held in a [`DelayQueue`] until their deadline
//! passes, then handed out by the single poller thread.
//!
//! # Architecture
//!
//! ```text
//!            Scheduler::after(delay, cb)
//!                       │
//!                       ▼
//!                  DelayQueue ──── wake on earlier insert ───┐
//!                       │                                    │
//!                       ▼                                    ▼
//!           ┌───────────────────────┐                 poller thread
//!           │   dyn TimerBackend    │ ◄── pop_due(now) ──────┘
//!           └───────────────────────┘                        │
//!                       │                                    ▼
//!              BucketTimerBackend                  dyn TimerDispatch
//!      (BTreeMap<deadline, FIFO bucket>)        (inline or worker pool)
//! ```

mod entry;
pub mod impls;
mod queue;
pub mod poller;

pub use entry::{TimerEntry, TimerHandle};
pub use impls::{create_backend, TimerBackendType};
pub use poller::{spawn_poller, Dispatched, InlineDispatch, PollerConfig, PollerHandle, PollerStats, TimerDispatch};
pub use queue::DelayQueue;

use std::fmt;
use std::time::Instant;

use dtask_core::{DTaskResult, Task};

/// A timer whose deadline has passed, detached from the backend
pub struct DueTimer {
    pub handle: TimerHandle,
    pub deadline: Instant,
    pub task: Task,
}

impl fmt::Debug for DueTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DueTimer")
            .field("handle", &self.handle)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    pub handle: TimerHandle,
    /// The entry's deadline is now the earliest pending one
    pub earliest: bool,
}

/// Core timer trait - implement this for different backends
///
/// All implementations must be thread-safe (Send + Sync): any thread may
/// insert or cancel while the poller pops.
pub trait TimerBackend: Send + Sync {
    /// Insert a timer entry
    ///
    /// `earliest` must be decided under the same lock as the insert, so a
    /// concurrent `pop_due` cannot make it stale. Fails with
    /// `TimerCapacity` when the backend is at its limit.
    fn schedule(&self, entry: TimerEntry) -> DTaskResult<Scheduled>;

    /// Insert a timer entry, returns handle for cancellation
    fn insert(&self, entry: TimerEntry) -> DTaskResult<TimerHandle> {
        self.schedule(entry).map(|s| s.handle)
    }

    /// Remove a timer that has not fired yet
    ///
    /// Returns true if the timer was found and removed. Shares the lock
    /// with `pop_due`, so exactly one of cancel/fire wins.
    fn cancel(&self, handle: TimerHandle) -> bool;

    /// Detach every entry with deadline <= `now`
    ///
    /// Earliest deadline first; insertion order within one deadline.
    fn pop_due(&self, now: Instant) -> Vec<DueTimer>;

    /// Detach everything, regardless of deadline (used on shutdown)
    fn drain(&self) -> Vec<DueTimer>;

    /// Earliest pending deadline, None if empty
    fn next_deadline(&self) -> Option<Instant>;

    /// Number of pending timers
    fn len(&self) -> usize;

    /// Check if no timers are scheduled
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lifetime counters
    fn stats(&self) -> TimerStats;

    /// Backend name for debugging/logging
    fn name(&self) -> &'static str {
        "unknown"
    }
}

/// Lifetime counters for a timer backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Currently pending timers
    pub pending: usize,
    /// Distinct deadlines currently held
    pub buckets: usize,
    pub total_inserted: u64,
    pub total_fired: u64,
    pub total_cancelled: u64,
    /// Inserts refused by the capacity limit
    pub total_rejected: u64,
}
