//! Bucketed timer backend
//!
//! Timers are grouped by exact deadline: `BTreeMap<Instant, VecDeque<_>>`.
//! Deadlines can collide (many callers compute "now + offset" in the same
//! tick), so each key holds a FIFO list rather than a single entry.
//!
//! # Firing
//!
//! `pop_due` detaches whole buckets from the map while holding the lock
//! and returns them; callbacks are invoked by the caller after the lock
//! is released. A bucket is never partially fired and never iterated
//! while it is still reachable from the map.
//!
//! # Cancellation
//!
//! Eager: a `handle -> deadline` index finds the bucket, the entry is
//! removed, and an emptied bucket drops its key.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use dtask_core::{DTaskError, DTaskResult, Task};

use crate::timer::{DueTimer, Scheduled, TimerBackend, TimerEntry, TimerHandle, TimerStats};

struct BucketInner {
    /// deadline -> callbacks in insertion order
    buckets: BTreeMap<Instant, VecDeque<(TimerHandle, Task)>>,

    /// handle -> deadline, for cancellation
    index: HashMap<TimerHandle, Instant>,

    total_inserted: u64,
    total_fired: u64,
    total_cancelled: u64,
    total_rejected: u64,
}

impl BucketInner {
    fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            index: HashMap::new(),
            total_inserted: 0,
            total_fired: 0,
            total_cancelled: 0,
            total_rejected: 0,
        }
    }

    /// Detach the earliest bucket if its deadline satisfies `due`
    fn detach_first(&mut self, due: impl Fn(Instant) -> bool, out: &mut Vec<DueTimer>) -> bool {
        let Some(first) = self.buckets.first_entry() else {
            return false;
        };
        if !due(*first.key()) {
            return false;
        }
        let (deadline, bucket) = first.remove_entry();
        for (handle, task) in bucket {
            self.index.remove(&handle);
            out.push(DueTimer {
                handle,
                deadline,
                task,
            });
        }
        true
    }
}

/// Ordered-bucket timer backend
///
/// Thread-safe via one internal Mutex, held only for map operations.
pub struct BucketTimerBackend {
    inner: Mutex<BucketInner>,
    limit: Option<usize>,
}

impl BucketTimerBackend {
    /// Unbounded backend
    pub fn new() -> Self {
        Self::with_limit(None)
    }

    /// Backend refusing inserts beyond `limit` pending timers
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            inner: Mutex::new(BucketInner::new()),
            limit,
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, BucketInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for BucketTimerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerBackend for BucketTimerBackend {
    fn schedule(&self, entry: TimerEntry) -> DTaskResult<Scheduled> {
        let mut inner = self.lock();
        if let Some(limit) = self.limit {
            if inner.index.len() >= limit {
                inner.total_rejected += 1;
                return Err(DTaskError::TimerCapacity { limit });
            }
        }
        let TimerEntry {
            handle,
            deadline,
            task,
        } = entry;
        inner
            .buckets
            .entry(deadline)
            .or_default()
            .push_back((handle, task));
        inner.index.insert(handle, deadline);
        inner.total_inserted += 1;
        let earliest = inner.buckets.keys().next() == Some(&deadline);
        Ok(Scheduled { handle, earliest })
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut inner = self.lock();
        let Some(deadline) = inner.index.remove(&handle) else {
            return false;
        };
        let mut emptied = false;
        let mut removed = None;
        if let Some(bucket) = inner.buckets.get_mut(&deadline) {
            if let Some(pos) = bucket.iter().position(|(h, _)| *h == handle) {
                removed = bucket.remove(pos);
            }
            emptied = bucket.is_empty();
        }
        if emptied {
            inner.buckets.remove(&deadline);
        }
        if removed.is_some() {
            inner.total_cancelled += 1;
        }
        // Drop the callback outside the lock: its captures may run arbitrary Drop code.
        drop(inner);
        removed.is_some()
    }

    fn pop_due(&self, now: Instant) -> Vec<DueTimer> {
        let mut expired = Vec::new();
        let mut inner = self.lock();
        while inner.detach_first(|deadline| deadline <= now, &mut expired) {}
        inner.total_fired += expired.len() as u64;
        expired
    }

    fn drain(&self) -> Vec<DueTimer> {
        let mut drained = Vec::new();
        let mut inner = self.lock();
        while inner.detach_first(|_| true, &mut drained) {}
        drained
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.lock().buckets.keys().next().copied()
    }

    fn len(&self) -> usize {
        self.lock().index.len()
    }

    fn stats(&self) -> TimerStats {
        let inner = self.lock();
        TimerStats {
            pending: inner.index.len(),
            buckets: inner.buckets.len(),
            total_inserted: inner.total_inserted,
            total_fired: inner.total_fired,
            total_cancelled: inner.total_cancelled,
            total_rejected: inner.total_rejected,
        }
    }

    fn name(&self) -> &'static str {
        "buckets"
    }
}
