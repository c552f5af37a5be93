//! DelayQueue - high-level timer API used by the scheduler
//!
//! Wraps a `TimerBackend` and adds the two things the poller needs:
//! a wake signal when an insert moves the earliest deadline forward,
//! and a closed flag so nothing is accepted after shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dtask_core::{DTaskError, DTaskResult, Task};
use tracing::trace;

use crate::parking::{ParkToken, Parking};
use crate::timer::{DueTimer, Scheduled, TimerBackend, TimerEntry, TimerHandle, TimerStats};

/// Thread-safe registry of deferred callbacks
///
/// Shared between callers (insert/cancel) and the poller (pop_due/park)
/// via `Arc`.
///
/// # Example
///
/// ```ignore
/// use dtask_runtime::timer::{create_backend, DelayQueue, TimerBackendType};
///
/// let queue = DelayQueue::new(create_backend(TimerBackendType::Buckets, None));
/// let handle = queue.insert(Duration::from_millis(100), Box::new(|| println!("due")))?;
///
/// // Changed our mind
/// queue.cancel(handle);
/// ```
pub struct DelayQueue {
    backend: Arc<dyn TimerBackend>,
    wake: Parking,
    closed: AtomicBool,
}

impl DelayQueue {
    /// Create a delay queue over the given backend
    pub fn new(backend: Arc<dyn TimerBackend>) -> Self {
        Self {
            backend,
            wake: Parking::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Get backend name (for logging)
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Schedule `task` to fire `delay` from now
    #[inline]
    pub fn insert(&self, delay: Duration, task: Task) -> DTaskResult<TimerHandle> {
        self.schedule(TimerEntry::after(delay, task))
    }

    /// Schedule `task` to fire at an absolute deadline
    #[inline]
    pub fn insert_at(&self, deadline: Instant, task: Task) -> DTaskResult<TimerHandle> {
        self.schedule(TimerEntry::at(deadline, task))
    }

    /// Schedule a prepared entry
    pub fn schedule(&self, entry: TimerEntry) -> DTaskResult<TimerHandle> {
        if self.is_closed() {
            return Err(DTaskError::ShutDown);
        }
        let Scheduled { handle, earliest } = self.backend.schedule(entry)?;
        if self.is_closed() && self.backend.cancel(handle) {
            // Lost the race with close(); the poller is gone.
            return Err(DTaskError::ShutDown);
        }
        if earliest {
            trace!(timer = %handle, "new earliest deadline, waking poller");
            self.wake.notify_all();
        }
        Ok(handle)
    }

    /// Cancel a timer that has not fired yet
    ///
    /// Returns false if it already fired, was already cancelled, or
    /// never existed. Never blocks on a running callback.
    #[inline]
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        self.backend.cancel(handle)
    }

    /// Detach every timer due at `now`, earliest first
    #[inline]
    pub fn pop_due(&self, now: Instant) -> Vec<DueTimer> {
        self.backend.pop_due(now)
    }

    /// Earliest pending deadline
    #[inline]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.backend.next_deadline()
    }

    /// Number of pending timers
    #[inline]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Check if any timers are scheduled
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Lifetime counters of the backend
    pub fn stats(&self) -> TimerStats {
        self.backend.stats()
    }

    /// Refuse further inserts and wake the poller
    ///
    /// Returns the timers that will now never fire.
    pub fn close(&self) -> Vec<DueTimer> {
        self.closed.store(true, Ordering::Release);
        self.wake.notify_all();
        self.backend.drain()
    }

    /// Check if `close()` was called
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // ========================================================================
    // Poller side
    // ========================================================================

    /// Snapshot the wake epoch before scanning
    pub(crate) fn prepare_wait(&self) -> ParkToken<'_> {
        self.wake.prepare()
    }

    /// Sleep until `deadline`, an earlier insert, or close
    pub(crate) fn wait(&self, token: ParkToken<'_>, deadline: Option<Instant>) -> bool {
        self.wake.park(token, deadline)
    }

    /// Interrupt a parked poller without changing any state
    pub(crate) fn wake_poller(&self) {
        self.wake.notify_all();
    }
}

impl std::fmt::Debug for DelayQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayQueue")
            .field("backend", &self.backend.name())
            .field("pending", &self.backend.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::impls::{create_backend, TimerBackendType};
    use std::thread;

    fn test_queue() -> Arc<DelayQueue> {
        Arc::new(DelayQueue::new(create_backend(TimerBackendType::Buckets, None)))
    }

    #[test]
    fn test_insert_and_cancel() {
        let queue = test_queue();
        let handle = queue.insert(Duration::from_millis(10), Box::new(|| {})).unwrap();
        assert_eq!(queue.len(), 1);

        assert!(queue.cancel(handle));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_closed_rejects_inserts() {
        let queue = test_queue();
        queue.insert(Duration::from_secs(10), Box::new(|| {})).unwrap();

        let discarded = queue.close();
        assert_eq!(discarded.len(), 1);
        assert!(queue.is_closed());
        assert_eq!(
            queue.insert(Duration::ZERO, Box::new(|| {})).unwrap_err(),
            DTaskError::ShutDown
        );
    }

    #[test]
    fn test_earlier_insert_wakes_waiter() {
        let queue = test_queue();
        queue.insert(Duration::from_secs(60), Box::new(|| {})).unwrap();

        let q2 = Arc::clone(&queue);
        let waiter = thread::spawn(move || {
            let token = q2.prepare_wait();
            let start = Instant::now();
            q2.wait(token, q2.next_deadline());
            start.elapsed()
        });

        thread::sleep(Duration::from_millis(30));
        queue.insert(Duration::from_millis(1), Box::new(|| {})).unwrap();

        let elapsed = waiter.join().unwrap();
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_debug() {
        let queue = test_queue();
        let debug = format!("{:?}", queue);
        assert!(debug.contains("DelayQueue"));
        assert!(debug.contains("buckets"));
    }
}
