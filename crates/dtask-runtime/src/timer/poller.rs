//! Timer poller thread
//!
//! Single thread that turns wall-clock time into callback firing.
//!
//! # Design
//!
//! The poller:
//! 1. Snapshots the delay queue's wake epoch
//! 2. Detaches every due timer (`pop_due`), earliest first
//! 3. Hands each one to a [`TimerDispatch`] (inline, or the worker pool)
//! 4. Waits per [`PollStrategy`]: until the next deadline / an earlier
//!    insert, or just yields
//!
//! A panicking callback is caught, logged and counted; the loop goes on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use dtask_core::{run_isolated, DTaskResult};
use tracing::{debug, error, warn};

use crate::config::{defaults, PollStrategy};
use crate::timer::{DelayQueue, DueTimer};

/// Configuration for the poller thread
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait strategy between scans
    pub strategy: PollStrategy,

    /// Longest single park, even with no timers pending
    pub max_park: Duration,

    /// Thread name
    pub thread_name: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            strategy: PollStrategy::WaitForNextDue,
            max_park: defaults::MAX_PARK,
            thread_name: format!("{}-poller", defaults::THREAD_PREFIX),
        }
    }
}

/// What happened to a due timer handed to a dispatcher
#[derive(Debug)]
pub enum Dispatched {
    /// Queued elsewhere (worker pool); outcome reported there
    Handed,
    /// Ran on the poller thread
    Inline(DTaskResult<()>),
    /// Pool refused it, so it ran on the poller thread instead
    Fallback(DTaskResult<()>),
}

/// Receives due timers from the poller
pub trait TimerDispatch: Send + Sync {
    /// Must not block for long: the poller is stalled meanwhile
    fn dispatch(&self, timer: DueTimer) -> Dispatched;
}

/// Runs callbacks directly on the poller thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineDispatch;

impl TimerDispatch for InlineDispatch {
    fn dispatch(&self, timer: DueTimer) -> Dispatched {
        Dispatched::Inline(run_isolated(timer.task))
    }
}

/// Handle to a running poller thread
pub struct PollerHandle {
    handle: Option<JoinHandle<PollerStats>>,
    shutdown: Arc<AtomicBool>,
    queue: Arc<DelayQueue>,
}

impl PollerHandle {
    /// Request shutdown and wait for the poller to exit
    pub fn shutdown(mut self) -> PollerStats {
        self.stop()
    }

    fn stop(&mut self) -> PollerStats {
        self.request_shutdown();
        match self.handle.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                error!("poller thread panicked");
                PollerStats::default()
            }
            None => PollerStats::default(),
        }
    }

    /// Request shutdown without waiting
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.queue.wake_poller();
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.stop();
        }
    }
}

/// Statistics from poller execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollerStats {
    /// Total scan iterations
    pub poll_count: u64,

    /// Total timers popped and dispatched
    pub timers_fired: u64,

    /// Callbacks that panicked while running on the poller
    pub callbacks_failed: u64,

    /// Callbacks run inline because the pool refused them
    pub inline_fallbacks: u64,

    /// Maximum batch size (timers fired in a single scan)
    pub max_batch_size: usize,
}

/// Spawn the poller thread
///
/// # Arguments
///
/// * `queue` - Delay queue to drain
/// * `dispatch` - Where due callbacks go
/// * `config` - Thread configuration
pub fn spawn_poller(
    queue: Arc<DelayQueue>,
    dispatch: Arc<dyn TimerDispatch>,
    config: PollerConfig,
) -> DTaskResult<PollerHandle> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let loop_queue = Arc::clone(&queue);

    let handle = thread::Builder::new()
        .name(config.thread_name.clone())
        .spawn(move || poll_loop(loop_queue, dispatch, flag, config))?;

    Ok(PollerHandle {
        handle: Some(handle),
        shutdown,
        queue,
    })
}

/// Main poller loop
fn poll_loop(
    queue: Arc<DelayQueue>,
    dispatch: Arc<dyn TimerDispatch>,
    shutdown: Arc<AtomicBool>,
    config: PollerConfig,
) -> PollerStats {
    let mut stats = PollerStats::default();
    debug!(strategy = %config.strategy, backend = queue.backend_name(), "poller started");

    while !shutdown.load(Ordering::Acquire) {
        let token = queue.prepare_wait();

        let expired = queue.pop_due(Instant::now());
        let batch_size = expired.len();

        stats.poll_count += 1;
        stats.timers_fired += batch_size as u64;
        stats.max_batch_size = stats.max_batch_size.max(batch_size);

        for timer in expired {
            let handle = timer.handle;
            match dispatch.dispatch(timer) {
                Dispatched::Handed => {}
                Dispatched::Inline(result) => record(&mut stats, handle, result),
                Dispatched::Fallback(result) => {
                    stats.inline_fallbacks += 1;
                    warn!(timer = %handle, "worker pool refused due callback, ran it on the poller");
                    record(&mut stats, handle, result);
                }
            }
        }

        match config.strategy {
            PollStrategy::BusyYield => {
                drop(token);
                thread::yield_now();
            }
            PollStrategy::WaitForNextDue => {
                // Re-check under the token: a shutdown signalled before it was taken is not replayed.
                if shutdown.load(Ordering::Acquire) {
                    break;
                }
                let cap = Instant::now() + config.max_park;
                let deadline = queue.next_deadline().map_or(cap, |d| d.min(cap));
                queue.wait(token, Some(deadline));
            }
        }
    }

    debug!(fired = stats.timers_fired, polls = stats.poll_count, "poller stopped");
    stats
}

fn record(stats: &mut PollerStats, handle: crate::timer::TimerHandle, result: DTaskResult<()>) {
    if let Err(e) = result {
        stats.callbacks_failed += 1;
        error!(timer = %handle, error = %e, "deferred callback failed");
    }
}
