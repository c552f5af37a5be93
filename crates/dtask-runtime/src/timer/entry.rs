//! Timer entry and handle types

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dtask_core::Task;

/// Globally unique timer handle for cancellation
///
/// Handles are allocated in increasing order, so they also record
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

impl TimerHandle {
    /// Generate a new unique timer handle
    #[inline]
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TimerHandle(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Timer entry - owned by the backend until it fires or is cancelled
pub struct TimerEntry {
    /// Unique handle for cancellation
    pub handle: TimerHandle,

    /// When this timer should fire
    pub deadline: Instant,

    /// Callback to run
    pub task: Task,
}

impl TimerEntry {
    /// Timer firing `delay` from now
    #[inline]
    pub fn after(delay: Duration, task: Task) -> Self {
        Self::at(Instant::now() + delay, task)
    }

    /// Timer with absolute deadline
    #[inline]
    pub fn at(deadline: Instant, task: Task) -> Self {
        Self {
            handle: TimerHandle::new(),
            deadline,
            task,
        }
    }
}

impl fmt::Debug for TimerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEntry")
            .field("handle", &self.handle)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
