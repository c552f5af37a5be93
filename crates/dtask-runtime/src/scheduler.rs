//! Scheduler facade
//!
//! Composes the [`DelayQueue`], its poller thread and the [`WorkerPool`]:
//!
//! - `after(delay, cb)`: run `cb` once `delay` has elapsed
//! - `submit(item)`: run `item` on a worker as soon as one is free
//! - Combine: a delayed callback that calls `submit` through a
//!   [`SchedulerHandle`]
//!
//! In [`FireMode::Pool`] due callbacks are pushed onto the worker pool
//! without blocking the poller; if the queue is full they run on the
//! poller instead.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dtask_core::{run_isolated, DTaskResult, Task};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{FireMode, SchedulerConfig};
use crate::parking::Parking;
use crate::pool::{PoolConfig, PoolStats, ResultHandle, TaskHandle, WorkerPool};
use crate::timer::{
    create_backend, spawn_poller, DelayQueue, Dispatched, DueTimer, InlineDispatch, PollerConfig,
    PollerHandle, PollerStats, TimerDispatch, TimerHandle,
};

/// Hands due timers to the worker pool without blocking the poller
struct PoolDispatch {
    pool: WorkerPool,
}

impl TimerDispatch for PoolDispatch {
    fn dispatch(&self, timer: DueTimer) -> Dispatched {
        match self.pool.try_push(timer.task) {
            Ok(_) => Dispatched::Handed,
            Err((_, task)) => Dispatched::Fallback(run_isolated(task)),
        }
    }
}

/// Timers accepted but not yet run or dropped
#[derive(Default)]
struct TimerTracker {
    count: AtomicUsize,
    idle: Parking,
}

impl TimerTracker {
    fn is_idle(&self) -> bool {
        self.count.load(Ordering::SeqCst) == 0
    }

    /// Block until no timer is outstanding; false on timeout
    fn wait_idle(&self, deadline: Instant) -> bool {
        loop {
            if self.is_idle() {
                return true;
            }
            let token = self.idle.prepare();
            if self.is_idle() {
                return true;
            }
            if !self.idle.park(token, Some(deadline)) && Instant::now() >= deadline {
                return self.is_idle();
            }
        }
    }
}

/// Moved into each timer callback; released when the callback has run,
/// or when it is dropped by cancel or shutdown
struct Outstanding(Arc<TimerTracker>);

impl Outstanding {
    fn new(tracker: &Arc<TimerTracker>) -> Self {
        tracker.count.fetch_add(1, Ordering::SeqCst);
        Outstanding(Arc::clone(tracker))
    }
}

impl Drop for Outstanding {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_all();
        }
    }
}

/// Cloneable access to a running scheduler
///
/// Callbacks capture one of these to schedule or submit further work.
/// Once the owning [`Scheduler`] shut down, every operation returns
/// `ShutDown`.
#[derive(Clone)]
pub struct SchedulerHandle {
    queue: Arc<DelayQueue>,
    pool: WorkerPool,
    timers: Arc<TimerTracker>,
}

impl SchedulerHandle {
    /// Run `callback` once `delay` has elapsed
    pub fn after<F>(&self, delay: Duration, callback: F) -> DTaskResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.at(Instant::now() + delay, callback)
    }

    /// Run `callback` at or after `deadline`
    pub fn at<F>(&self, deadline: Instant, callback: F) -> DTaskResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = Outstanding::new(&self.timers);
        let task: Task = Box::new(move || {
            let _guard = guard;
            callback();
        });
        self.queue.insert_at(deadline, task)
    }

    /// Run `callback` after a delay drawn uniformly from `range`
    ///
    /// An empty range uses `range.start`.
    pub fn after_random<F>(&self, range: Range<Duration>, callback: F) -> DTaskResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = if range.is_empty() {
            range.start
        } else {
            rand::thread_rng().gen_range(range)
        };
        self.after(delay, callback)
    }

    /// Cancel a timer that has not fired yet
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        self.queue.cancel(handle)
    }

    /// Submit to the worker pool per the configured queue-full policy
    pub fn submit<F>(&self, item: F) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.submit(item)
    }

    /// Submit without blocking; `QueueFull` at capacity
    pub fn try_submit<F>(&self, item: F) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.try_submit(item)
    }

    /// Submit work producing a value
    pub fn submit_with_result<T, F>(&self, item: F) -> DTaskResult<ResultHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.pool.submit_with_result(item)
    }

    /// Timers not yet fired
    pub fn pending_timers(&self) -> usize {
        self.queue.len()
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("queue", &self.queue)
            .field("pool", &self.pool)
            .finish()
    }
}

/// Counter snapshot across the delay queue, poller and pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Timers waiting for their deadline
    pub timers_pending: usize,
    pub timers_fired: u64,
    pub timers_cancelled: u64,
    /// Inserts refused by `max_pending_timers`
    pub timers_rejected: u64,
    /// Timers dropped unfired by shutdown
    pub timers_discarded: u64,
    pub pool: PoolStats,
    /// Poller counters; only known once the poller has stopped
    pub poller: Option<PollerStats>,
}

/// Deferred task scheduler
///
/// Owns one poller thread and `num_workers` worker threads. Dropping it
/// shuts down like [`Scheduler::shutdown`].
///
/// # Example
///
/// ```ignore
/// let scheduler = Scheduler::new(SchedulerConfig::from_env())?;
/// let handle = scheduler.handle();
/// scheduler.after(Duration::from_millis(100), move || {
///     handle.submit(|| println!("write response")).ok();
/// })?;
/// scheduler.wait_idle(Duration::from_secs(1));
/// let stats = scheduler.shutdown();
/// ```
pub struct Scheduler {
    handle: SchedulerHandle,
    poller: Option<PollerHandle>,
    fire_mode: FireMode,
    discarded: u64,
}

impl Scheduler {
    /// Validate `config` and start the poller and worker threads
    pub fn new(config: SchedulerConfig) -> DTaskResult<Self> {
        config.validate()?;

        let backend = create_backend(config.timer_backend, config.max_pending_timers);
        let queue = Arc::new(DelayQueue::new(backend));
        let pool = WorkerPool::new(PoolConfig::from(&config))?;

        let dispatch: Arc<dyn TimerDispatch> = match config.fire_mode {
            FireMode::Pool => Arc::new(PoolDispatch { pool: pool.clone() }),
            FireMode::Inline => Arc::new(InlineDispatch),
        };
        let poller_config = PollerConfig {
            strategy: config.poll_strategy,
            max_park: config.max_park,
            thread_name: format!("{}-poller", config.thread_prefix),
        };
        let poller = match spawn_poller(Arc::clone(&queue), dispatch, poller_config) {
            Ok(poller) => poller,
            Err(e) => {
                pool.shutdown();
                return Err(e);
            }
        };

        info!(
            workers = config.num_workers,
            capacity = config.queue_capacity,
            fire_mode = ?config.fire_mode,
            strategy = %config.poll_strategy,
            backend = queue.backend_name(),
            "scheduler started"
        );

        Ok(Scheduler {
            handle: SchedulerHandle {
                queue,
                pool,
                timers: Arc::new(TimerTracker::default()),
            },
            poller: Some(poller),
            fire_mode: config.fire_mode,
            discarded: 0,
        })
    }

    /// Cloneable handle for use inside callbacks
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Where due callbacks run
    pub fn fire_mode(&self) -> FireMode {
        self.fire_mode
    }

    /// Run `callback` once `delay` has elapsed
    pub fn after<F>(&self, delay: Duration, callback: F) -> DTaskResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.after(delay, callback)
    }

    /// Run `callback` at or after `deadline`
    pub fn at<F>(&self, deadline: Instant, callback: F) -> DTaskResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.at(deadline, callback)
    }

    /// Run `callback` after a delay drawn uniformly from `range`
    pub fn after_random<F>(&self, range: Range<Duration>, callback: F) -> DTaskResult<TimerHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.after_random(range, callback)
    }

    /// Cancel a timer that has not fired yet
    ///
    /// Returns false if it already fired, was cancelled, or never existed.
    pub fn cancel(&self, handle: TimerHandle) -> bool {
        self.handle.cancel(handle)
    }

    /// Submit to the worker pool per the configured queue-full policy
    pub fn submit<F>(&self, item: F) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.submit(item)
    }

    /// Submit without blocking; `QueueFull` at capacity
    pub fn try_submit<F>(&self, item: F) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.try_submit(item)
    }

    /// Submit work producing a value
    pub fn submit_with_result<T, F>(&self, item: F) -> DTaskResult<ResultHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.handle.submit_with_result(item)
    }

    /// Wait until no timer is outstanding and the pool is idle
    ///
    /// Returns false if `timeout` elapsed first.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.handle.timers.wait_idle(deadline) {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !self.handle.pool.wait_idle(remaining) {
                return false;
            }
            // Pool work may have scheduled new timers.
            if self.handle.timers.is_idle() {
                return true;
            }
        }
    }

    /// Current counters
    pub fn stats(&self) -> SchedulerStats {
        let timers = self.handle.queue.stats();
        SchedulerStats {
            timers_pending: timers.pending,
            timers_fired: timers.total_fired,
            timers_cancelled: timers.total_cancelled,
            timers_rejected: timers.total_rejected,
            timers_discarded: self.discarded,
            pool: self.handle.pool.stats(),
            poller: None,
        }
    }

    /// Stop the poller and the workers
    ///
    /// Pending timers are discarded; queued pool work runs to completion.
    pub fn shutdown(mut self) -> SchedulerStats {
        self.stop()
    }

    fn stop(&mut self) -> SchedulerStats {
        let Some(poller) = self.poller.take() else {
            return self.stats();
        };

        let discarded = self.handle.queue.close();
        self.discarded = discarded.len() as u64;
        drop(discarded);

        let poller_stats = poller.shutdown();
        self.handle.pool.shutdown();

        let mut stats = self.stats();
        stats.poller = Some(poller_stats);
        debug!(
            fired = stats.timers_fired,
            discarded = stats.timers_discarded,
            completed = stats.pool.completed,
            "scheduler stopped"
        );
        stats
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("handle", &self.handle)
            .field("fire_mode", &self.fire_mode)
            .field("running", &self.poller.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PollStrategy, QueueFullPolicy};
    use dtask_core::DTaskError;
    use std::sync::atomic::AtomicBool;
    use std::sync::Mutex;
    use std::thread;

    fn config() -> SchedulerConfig {
        SchedulerConfig::defaults()
            .num_workers(4)
            .queue_capacity(64)
            .thread_prefix("sched-test")
    }

    fn scheduler() -> Scheduler {
        Scheduler::new(config()).unwrap()
    }

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce() + Send>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&log);
        let make = move |name: &'static str| -> Box<dyn FnOnce() + Send> {
            let l = Arc::clone(&l);
            Box::new(move || l.lock().unwrap().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_earlier_deadline_fires_first() {
        let scheduler = Scheduler::new(config().fire_mode(FireMode::Inline)).unwrap();
        let (log, make) = recorder();

        scheduler.after(Duration::from_millis(60), make("late")).unwrap();
        scheduler.after(Duration::from_millis(20), make("early")).unwrap();

        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
    }

    #[test]
    fn test_later_insert_with_shorter_delay_fires_first() {
        let scheduler = Scheduler::new(config().fire_mode(FireMode::Inline)).unwrap();
        let (log, make) = recorder();
        let start = Instant::now();

        scheduler.after(Duration::from_millis(100), make("100ms")).unwrap();
        scheduler.after(Duration::from_millis(50), make("50ms")).unwrap();

        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert_eq!(*log.lock().unwrap(), vec!["50ms", "100ms"]);
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_same_deadline_fires_in_insertion_order() {
        let scheduler = Scheduler::new(config().fire_mode(FireMode::Inline)).unwrap();
        let (log, make) = recorder();
        let deadline = Instant::now() + Duration::from_millis(30);

        for name in ["a", "b", "c", "d"] {
            scheduler.at(deadline, make(name)).unwrap();
        }

        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_never_fires_early() {
        let scheduler = scheduler();
        let fired_at = Arc::new(Mutex::new(None));
        let f = Arc::clone(&fired_at);
        let start = Instant::now();

        scheduler
            .after(Duration::from_millis(80), move || {
                *f.lock().unwrap() = Some(Instant::now());
            })
            .unwrap();

        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        let fired = fired_at.lock().unwrap().unwrap();
        assert!(fired.duration_since(start) >= Duration::from_millis(80));
    }

    #[test]
    fn test_busy_yield_strategy_fires() {
        let scheduler =
            Scheduler::new(config().poll_strategy(PollStrategy::BusyYield)).unwrap();
        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        scheduler
            .after(Duration::from_millis(10), move || f.store(true, Ordering::SeqCst))
            .unwrap();
        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let scheduler = scheduler();
        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);

        let handle = scheduler
            .after(Duration::from_millis(50), move || f.store(true, Ordering::SeqCst))
            .unwrap();
        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));

        // Cancelled timers do not count as outstanding.
        assert!(scheduler.wait_idle(Duration::from_millis(10)));
        thread::sleep(Duration::from_millis(100));
        assert!(!fired.load(Ordering::SeqCst));
        assert_eq!(scheduler.stats().timers_cancelled, 1);
    }

    #[test]
    fn test_cancel_after_fire_fails() {
        let scheduler = scheduler();
        let handle = scheduler.after(Duration::from_millis(5), || {}).unwrap();
        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert!(!scheduler.cancel(handle));
    }

    #[test]
    fn test_panicking_callback_is_isolated() {
        for mode in [FireMode::Pool, FireMode::Inline] {
            let scheduler = Scheduler::new(config().fire_mode(mode)).unwrap();
            let (log, make) = recorder();

            scheduler
                .after(Duration::from_millis(10), || panic!("deferred callback exploded"))
                .unwrap();
            scheduler.after(Duration::from_millis(30), make("survivor")).unwrap();

            assert!(scheduler.wait_idle(Duration::from_secs(5)));
            assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
            assert_eq!(scheduler.stats().timers_fired, 2);

            let stats = scheduler.shutdown();
            let failed = stats.pool.panicked + stats.poller.unwrap().callbacks_failed;
            assert_eq!(failed, 1);
        }
    }

    #[test]
    fn test_combine_delayed_submit() {
        let scheduler = scheduler();
        let handle = scheduler.handle();
        let worker_name = Arc::new(Mutex::new(None));
        let w = Arc::clone(&worker_name);
        let start = Instant::now();

        scheduler
            .after(Duration::from_millis(40), move || {
                handle
                    .submit(move || {
                        *w.lock().unwrap() = thread::current().name().map(str::to_string);
                    })
                    .unwrap();
            })
            .unwrap();

        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert!(start.elapsed() >= Duration::from_millis(40));
        let name = worker_name.lock().unwrap().clone().unwrap();
        assert!(name.starts_with("sched-test-worker-"), "ran on {}", name);
        assert_eq!(scheduler.stats().pool.completed, 2);
    }

    #[test]
    fn test_combine_into_full_queue_does_not_deadlock() {
        let scheduler = Scheduler::new(
            config()
                .num_workers(1)
                .queue_capacity(1)
                .queue_full(QueueFullPolicy::Block),
        )
        .unwrap();
        let handle = scheduler.handle();
        let ran = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let (r, f) = (Arc::clone(&ran), Arc::clone(&finished));
        scheduler
            .after(Duration::from_millis(5), move || {
                for _ in 0..2 {
                    let r = Arc::clone(&r);
                    handle
                        .submit(move || {
                            r.fetch_add(1, Ordering::SeqCst);
                        })
                        .unwrap();
                }
                f.store(true, Ordering::SeqCst);
            })
            .unwrap();

        assert!(scheduler.wait_idle(Duration::from_secs(2)));
        assert!(finished.load(Ordering::SeqCst));
        assert_eq!(ran.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pool_mode_runs_callbacks_on_workers() {
        let scheduler = scheduler();
        let thread_name = Arc::new(Mutex::new(String::new()));
        let t = Arc::clone(&thread_name);
        scheduler
            .after(Duration::from_millis(5), move || {
                *t.lock().unwrap() = thread::current().name().unwrap_or_default().to_string();
            })
            .unwrap();
        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        assert!(thread_name.lock().unwrap().starts_with("sched-test-worker-"));
    }

    #[test]
    fn test_full_pool_falls_back_to_poller() {
        let scheduler = Scheduler::new(
            config()
                .num_workers(1)
                .queue_capacity(1)
                .queue_full(QueueFullPolicy::FailFast),
        )
        .unwrap();
        let (release, gate) = std::sync::mpsc::channel::<()>();
        let started = Arc::new(AtomicBool::new(false));
        let s = Arc::clone(&started);
        scheduler
            .submit(move || {
                s.store(true, Ordering::SeqCst);
                let _ = gate.recv();
            })
            .unwrap();
        while !started.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        scheduler.submit(|| {}).unwrap();

        let ran_on = Arc::new(Mutex::new(String::new()));
        let r = Arc::clone(&ran_on);
        scheduler
            .after(Duration::from_millis(5), move || {
                *r.lock().unwrap() = thread::current().name().unwrap_or_default().to_string();
            })
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while ran_on.lock().unwrap().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(*ran_on.lock().unwrap(), "sched-test-poller");

        drop(release);
        let stats = scheduler.shutdown();
        assert_eq!(stats.poller.unwrap().inline_fallbacks, 1);
    }

    #[test]
    fn test_after_random_within_range() {
        let scheduler = scheduler();
        let fired_at = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();
        for _ in 0..5 {
            let f = Arc::clone(&fired_at);
            scheduler
                .after_random(Duration::from_millis(20)..Duration::from_millis(60), move || {
                    f.lock().unwrap().push(Instant::now());
                })
                .unwrap();
        }
        // Empty range uses its start.
        scheduler
            .after_random(Duration::from_millis(20)..Duration::from_millis(20), || {})
            .unwrap();

        assert!(scheduler.wait_idle(Duration::from_secs(5)));
        let fired = fired_at.lock().unwrap();
        assert_eq!(fired.len(), 5);
        assert!(fired.iter().all(|t| t.duration_since(start) >= Duration::from_millis(20)));
    }

    #[test]
    fn test_timer_capacity_limit() {
        let scheduler = Scheduler::new(config().max_pending_timers(Some(2))).unwrap();
        scheduler.after(Duration::from_secs(60), || {}).unwrap();
        scheduler.after(Duration::from_secs(60), || {}).unwrap();
        assert_eq!(
            scheduler.after(Duration::from_secs(60), || {}).unwrap_err(),
            DTaskError::TimerCapacity { limit: 2 }
        );
        assert_eq!(scheduler.stats().timers_rejected, 1);
    }

    #[test]
    fn test_shutdown_discards_timers_and_drains_pool() {
        let scheduler = scheduler();
        let handle = scheduler.handle();
        let fired = Arc::new(AtomicBool::new(false));
        let f = Arc::clone(&fired);
        scheduler
            .after(Duration::from_secs(60), move || f.store(true, Ordering::SeqCst))
            .unwrap();
        scheduler.after(Duration::from_secs(60), || {}).unwrap();

        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let ran = Arc::clone(&ran);
            scheduler
                .submit(move || {
                    thread::sleep(Duration::from_millis(1));
                    ran.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }

        let stats = scheduler.shutdown();
        assert_eq!(stats.timers_discarded, 2);
        assert_eq!(stats.timers_pending, 0);
        assert_eq!(ran.load(Ordering::SeqCst), 20);
        assert!(!fired.load(Ordering::SeqCst));
        assert!(stats.poller.is_some());

        assert_eq!(handle.after(Duration::ZERO, || {}).unwrap_err(), DTaskError::ShutDown);
        assert_eq!(handle.submit(|| {}).unwrap_err(), DTaskError::ShutDown);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Scheduler::new(config().num_workers(0)).unwrap_err();
        assert!(matches!(err, DTaskError::InvalidConfig(_)));
    }

    #[test]
    fn test_drop_stops_threads() {
        let scheduler = scheduler();
        let handle = scheduler.handle();
        scheduler.after(Duration::from_secs(60), || {}).unwrap();
        drop(scheduler);
        assert_eq!(handle.pending_timers(), 0);
        assert!(handle.submit(|| {}).is_err());
    }
}
