//! Parking primitive for idle threads
//!
//! An epoch counter guarded by a mutex plus a condition variable.
//! A waiter first takes a [`ParkToken`] (snapshot of the epoch), re-checks
//! whatever condition it is waiting for, and only then parks. Any
//! `notify_*` issued after the token was taken bumps the epoch, so the
//! park returns immediately instead of missing the wakeup.
//!
//! Used by the worker pool (queue not empty / not full / idle) and by the
//! delay queue to interrupt the poller when an earlier deadline arrives.

use std::sync::atomic::{fence, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

/// Epoch-count parking lot
pub struct Parking {
    /// Bumped by every notify
    epoch: Mutex<u64>,

    condvar: Condvar,

    /// Threads holding a token (hint for skipping notifies)
    waiters: AtomicUsize,
}

/// Snapshot taken before re-checking the wait condition
///
/// Dropping the token without parking is fine; it just deregisters.
pub struct ParkToken<'a> {
    parking: &'a Parking,
    epoch: u64,
}

impl Drop for ParkToken<'_> {
    fn drop(&mut self) {
        self.parking.waiters.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Parking {
    pub fn new() -> Self {
        Self {
            epoch: Mutex::new(0),
            condvar: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register as a waiter and snapshot the epoch
    pub fn prepare(&self) -> ParkToken<'_> {
        self.waiters.fetch_add(1, Ordering::SeqCst);
        fence(Ordering::SeqCst);
        let epoch = *self.lock();
        ParkToken {
            parking: self,
            epoch,
        }
    }

    /// Park until notified after `token` was taken, or until `deadline`
    ///
    /// Returns `true` if the epoch moved (re-check the condition),
    /// `false` on timeout with no notification.
    pub fn park(&self, token: ParkToken<'_>, deadline: Option<Instant>) -> bool {
        let mut guard = self.lock();
        loop {
            if *guard != token.epoch {
                return true;
            }
            match deadline {
                None => {
                    guard = self.condvar.wait(guard).unwrap_or_else(|e| e.into_inner());
                }
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (g, _) = self
                        .condvar
                        .wait_timeout(guard, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    guard = g;
                }
            }
        }
    }

    /// Wake one parked thread
    pub fn notify_one(&self) {
        if self.bump() {
            self.condvar.notify_one();
        }
    }

    /// Wake every parked thread
    pub fn notify_all(&self) {
        if self.bump() {
            self.condvar.notify_all();
        }
    }

    /// Advance the epoch if anyone holds a token
    fn bump(&self) -> bool {
        fence(Ordering::SeqCst);
        if self.waiters.load(Ordering::SeqCst) == 0 {
            return false;
        }
        let mut guard = self.lock();
        *guard = guard.wrapping_add(1);
        true
    }

    /// Number of threads currently holding a token (hint, may be stale)
    #[cfg(test)]
    fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }
}

impl Default for Parking {
    fn default() -> Self {
        Self::new()
    }
}
