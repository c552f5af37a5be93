//! Bounded worker pool
//!
//! `N` long-lived OS threads drain one bounded FIFO
//! (`crossbeam_queue::ArrayQueue`). Each dequeued item goes to exactly one
//! worker. When the queue is at capacity, `submit` applies the configured
//! [`QueueFullPolicy`]: block, block with timeout, or fail fast. Work is
//! never dropped silently.
//!
//! Idle workers and blocked producers sleep on [`Parking`] instead of
//! spinning.
//!
//! A worker of this pool never blocks on its own full queue: a blocking
//! `submit` from inside a work item (e.g. a delayed callback handing off
//! follow-up work) runs the new item inline on that worker instead.

mod handle;

pub use handle::{ResultHandle, TaskHandle, TaskState};

use std::panic::{self, AssertUnwindSafe};
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_queue::ArrayQueue;
use dtask_core::{panic_message, run_isolated, DTaskError, DTaskResult, Task, TaskId};
use tracing::{debug, error, warn};

use crate::config::{QueueFullPolicy, SchedulerConfig};
use crate::parking::Parking;
use handle::StateCell;

/// Pool sizing and backpressure settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Worker threads
    pub num_workers: usize,
    /// Queue capacity
    pub queue_capacity: usize,
    /// Behaviour of `submit` at capacity
    pub queue_full: QueueFullPolicy,
    /// Worker threads are named `<prefix>-worker-<i>`
    pub thread_prefix: String,
}

impl From<&SchedulerConfig> for PoolConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            num_workers: config.num_workers,
            queue_capacity: config.queue_capacity,
            queue_full: config.queue_full,
            thread_prefix: config.thread_prefix.clone(),
        }
    }
}

impl PoolConfig {
    pub fn new(num_workers: usize, queue_capacity: usize) -> Self {
        Self {
            num_workers,
            queue_capacity,
            queue_full: QueueFullPolicy::Block,
            thread_prefix: crate::config::defaults::THREAD_PREFIX.to_string(),
        }
    }

    /// Set queue-full policy
    pub fn queue_full(mut self, policy: QueueFullPolicy) -> Self {
        self.queue_full = policy;
        self
    }

    /// Set worker thread name prefix
    pub fn thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }
}

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub workers: usize,
    pub capacity: usize,
    /// Items sitting in the queue (cancelled ones included until dequeued)
    pub queued: usize,
    /// Items currently executing
    pub active: usize,
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    pub cancelled: u64,
    /// Public submissions refused with `QueueFull`
    pub rejected: u64,
}

thread_local! {
    /// Address of the `Shared` this thread works for; 0 off-pool
    static WORKER_OF: Cell<usize> = const { Cell::new(0) };
}

/// A queued unit of work
struct Job {
    id: TaskId,
    state: Arc<StateCell>,
    task: Task,
}

/// How long a producer may wait for a free slot
#[derive(Debug, Clone, Copy)]
enum Wait {
    No,
    Until(Instant),
    Forever,
}

/// State shared by producers and workers
struct Shared {
    queue: ArrayQueue<Job>,
    not_empty: Parking,
    not_full: Parking,
    idle: Parking,
    shutdown: AtomicBool,
    /// Accepted but not yet finished or discarded
    outstanding: AtomicUsize,
    active: AtomicUsize,
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
    cancelled: AtomicU64,
    rejected: AtomicU64,
}

impl Shared {
    #[inline]
    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// True on a worker thread of this pool
    fn is_own_worker(&self) -> bool {
        let me = self as *const Shared as usize;
        WORKER_OF.with(|w| w.get() == me)
    }

    /// Enqueue, waiting for capacity per `wait`
    ///
    /// On failure the task is handed back with the error.
    fn push(&self, task: Task, wait: Wait) -> Result<TaskHandle, (DTaskError, Task)> {
        let start = Instant::now();
        let state = StateCell::new();
        let mut job = Job {
            id: TaskId::next(),
            state: Arc::clone(&state),
            task,
        };
        let handle = TaskHandle::new(job.id, state);

        self.outstanding.fetch_add(1, Ordering::SeqCst);
        loop {
            if self.is_shutdown() {
                return Err(self.refuse(job, DTaskError::ShutDown));
            }
            job = match self.queue.push(job) {
                Ok(()) => return Ok(self.accepted(handle)),
                Err(job) => job,
            };
            let deadline = match wait {
                Wait::No => return Err(self.refuse_full(job, start)),
                Wait::Until(deadline) if Instant::now() >= deadline => {
                    return Err(self.refuse_full(job, start));
                }
                Wait::Until(_) | Wait::Forever if self.is_own_worker() => {
                    return Ok(self.run_on_caller(job, handle));
                }
                Wait::Until(deadline) => Some(deadline),
                Wait::Forever => None,
            };

            let token = self.not_full.prepare();
            // Retry under the token so a slot freed since the failed push is not missed.
            job = match self.queue.push(job) {
                Ok(()) => return Ok(self.accepted(handle)),
                Err(job) => job,
            };
            if self.is_shutdown() {
                return Err(self.refuse(job, DTaskError::ShutDown));
            }
            self.not_full.park(token, deadline);
        }
    }

    fn accepted(&self, handle: TaskHandle) -> TaskHandle {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        self.not_empty.notify_one();
        // Shutdown may have drained and joined before the push landed.
        if self.shutdown.load(Ordering::SeqCst) {
            self.drain_on_caller();
        }
        handle
    }

    /// Full queue on a blocking submit from one of our own workers
    fn run_on_caller(&self, job: Job, handle: TaskHandle) -> TaskHandle {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!(task_id = %job.id, "queue full on own worker, running inline");
        let id = job.id;
        if let Some(Err(e)) = self.execute(job) {
            error!(task_id = %id, error = %e, "work item failed");
        }
        handle
    }

    /// Run whatever is still queued on the calling thread
    fn drain_on_caller(&self) {
        while let Some(job) = self.pop() {
            let id = job.id;
            if let Some(Err(e)) = self.execute(job) {
                error!(task_id = %id, error = %e, "work item failed during shutdown drain");
            }
        }
    }

    fn refuse_full(&self, job: Job, start: Instant) -> (DTaskError, Task) {
        let err = DTaskError::QueueFull {
            capacity: self.queue.capacity(),
            waited: start.elapsed(),
        };
        self.refuse(job, err)
    }

    fn refuse(&self, job: Job, err: DTaskError) -> (DTaskError, Task) {
        self.finish_one();
        (err, job.task)
    }

    /// Take one item, notifying a blocked producer
    #[inline]
    fn pop(&self) -> Option<Job> {
        let job = self.queue.pop();
        if job.is_some() {
            self.not_full.notify_one();
        }
        job
    }

    /// Run a dequeued job; `None` if it had been cancelled
    fn execute(&self, job: Job) -> Option<DTaskResult<()>> {
        if !job.state.transition(TaskState::Running) {
            self.cancelled.fetch_add(1, Ordering::Relaxed);
            self.finish_one();
            return None;
        }
        self.active.fetch_add(1, Ordering::Relaxed);
        let result = run_isolated(job.task);
        match result {
            Ok(()) => self.completed.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.panicked.fetch_add(1, Ordering::Relaxed),
        };
        job.state.finish();
        self.active.fetch_sub(1, Ordering::Relaxed);
        self.finish_one();
        Some(result)
    }

    fn finish_one(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_all();
        }
    }
}

/// Owner of the worker threads; dropping the last pool handle shuts down
struct PoolCore {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    num_workers: usize,
    policy: QueueFullPolicy,
}

impl Drop for PoolCore {
    fn drop(&mut self) {
        shutdown_core(self);
    }
}

/// Fixed-size pool of worker threads over a bounded queue
///
/// Cheap to clone; all clones share the same workers and queue.
///
/// # Example
///
/// ```ignore
/// let pool = WorkerPool::new(PoolConfig::new(8, 1024))?;
/// let handle = pool.submit(|| println!("on a worker"))?;
/// let sum = pool.submit_with_result(|| 2 + 2)?.wait()?;
/// pool.shutdown();
/// ```
#[derive(Clone)]
pub struct WorkerPool {
    core: Arc<PoolCore>,
}

impl WorkerPool {
    /// Spawn `num_workers` threads over a queue of `queue_capacity`
    pub fn new(config: PoolConfig) -> DTaskResult<Self> {
        if config.num_workers == 0 {
            return Err(DTaskError::InvalidConfig("num_workers must be at least 1".into()));
        }
        if config.queue_capacity == 0 {
            return Err(DTaskError::InvalidConfig("queue_capacity must be at least 1".into()));
        }

        let shared = Arc::new(Shared {
            queue: ArrayQueue::new(config.queue_capacity),
            not_empty: Parking::new(),
            not_full: Parking::new(),
            idle: Parking::new(),
            shutdown: AtomicBool::new(false),
            outstanding: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            panicked: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        });
        let core = PoolCore {
            shared: Arc::clone(&shared),
            workers: Mutex::new(Vec::with_capacity(config.num_workers)),
            num_workers: config.num_workers,
            policy: config.queue_full,
        };

        for worker_id in 0..config.num_workers {
            let shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("{}-worker-{}", config.thread_prefix, worker_id))
                .spawn(move || worker_loop(shared, worker_id));
            match spawned {
                Ok(handle) => lock_workers(&core).push(handle),
                // `core` drops here and joins the workers already started.
                Err(e) => return Err(e.into()),
            }
        }
        debug!(
            workers = config.num_workers,
            capacity = config.queue_capacity,
            policy = ?config.queue_full,
            "worker pool started"
        );

        Ok(WorkerPool { core: Arc::new(core) })
    }

    #[inline]
    fn shared(&self) -> &Shared {
        &self.core.shared
    }

    /// Submit per the configured queue-full policy
    pub fn submit<F>(&self, f: F) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_task(Box::new(f))
    }

    /// Submit a boxed task per the configured queue-full policy
    pub fn submit_task(&self, task: Task) -> DTaskResult<TaskHandle> {
        let wait = match self.core.policy {
            QueueFullPolicy::Block => Wait::Forever,
            QueueFullPolicy::Timeout(d) => Wait::Until(Instant::now() + d),
            QueueFullPolicy::FailFast => Wait::No,
        };
        self.push(task, wait)
    }

    /// Submit without blocking; `QueueFull` at capacity
    pub fn try_submit<F>(&self, f: F) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Box::new(f), Wait::No)
    }

    /// Submit, blocking at most `timeout` for a free slot
    pub fn submit_timeout<F>(&self, f: F, timeout: Duration) -> DTaskResult<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Box::new(f), Wait::Until(Instant::now() + timeout))
    }

    /// Submit work producing a value, per the configured policy
    pub fn submit_with_result<T, F>(&self, f: F) -> DTaskResult<ResultHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let task: Task = Box::new(move || match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                let _ = tx.send(Ok(value));
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                let _ = tx.send(Err(DTaskError::CallbackFailed { message }));
                // Let the worker boundary log and count it as well.
                panic::resume_unwind(payload);
            }
        });
        let task = self.submit_task(task)?;
        Ok(ResultHandle::new(task, rx))
    }

    /// Non-blocking submit that returns the task on refusal
    ///
    /// Refusals here are not counted in `PoolStats::rejected`; the caller
    /// keeps the task and reports it.
    pub(crate) fn try_push(&self, task: Task) -> Result<TaskHandle, (DTaskError, Task)> {
        self.shared().push(task, Wait::No)
    }

    fn push(&self, task: Task, wait: Wait) -> DTaskResult<TaskHandle> {
        self.shared().push(task, wait).map_err(|(err, _task)| {
            if err.is_backpressure() {
                self.shared().rejected.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "submission refused");
            }
            err
        })
    }

    /// Block until every accepted item finished, or `timeout` elapsed
    ///
    /// Returns true if the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let shared = self.shared();
        let deadline = Instant::now() + timeout;
        loop {
            if shared.outstanding.load(Ordering::SeqCst) == 0 {
                return true;
            }
            let token = shared.idle.prepare();
            if shared.outstanding.load(Ordering::SeqCst) == 0 {
                return true;
            }
            if !shared.idle.park(token, Some(deadline)) && Instant::now() >= deadline {
                return shared.outstanding.load(Ordering::SeqCst) == 0;
            }
        }
    }

    /// Stop accepting work, drain the queue, join all workers
    ///
    /// Idempotent. Producers blocked on a full queue get `ShutDown`.
    pub fn shutdown(&self) -> PoolStats {
        shutdown_core(&self.core);
        self.stats()
    }

    /// Check if shutdown was requested
    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.shared().is_shutdown()
    }

    /// Number of worker threads
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.core.num_workers
    }

    /// Queue capacity
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared().queue.capacity()
    }

    /// Items currently queued
    #[inline]
    pub fn queued(&self) -> usize {
        self.shared().queue.len()
    }

    /// Counter snapshot
    pub fn stats(&self) -> PoolStats {
        let s = self.shared();
        PoolStats {
            workers: self.core.num_workers,
            capacity: s.queue.capacity(),
            queued: s.queue.len(),
            active: s.active.load(Ordering::Relaxed),
            submitted: s.submitted.load(Ordering::Relaxed),
            completed: s.completed.load(Ordering::Relaxed),
            panicked: s.panicked.load(Ordering::Relaxed),
            cancelled: s.cancelled.load(Ordering::Relaxed),
            rejected: s.rejected.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.core.num_workers)
            .field("capacity", &self.capacity())
            .field("queued", &self.queued())
            .finish()
    }
}

fn lock_workers(core: &PoolCore) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
    core.workers.lock().unwrap_or_else(|e| e.into_inner())
}

fn shutdown_core(core: &PoolCore) {
    let shared = &core.shared;
    if !shared.shutdown.swap(true, Ordering::SeqCst) {
        debug!(queued = shared.queue.len(), "worker pool shutting down");
    }
    shared.not_empty.notify_all();
    shared.not_full.notify_all();

    let handles = std::mem::take(&mut *lock_workers(core));
    let me = thread::current().id();
    for handle in handles {
        if handle.thread().id() == me {
            continue;
        }
        if handle.join().is_err() {
            error!("worker thread panicked outside task isolation");
        }
    }

    // A producer can win the race against the last worker exiting.
    shared.drain_on_caller();
}

/// Worker main loop: take one, run it, repeat
fn worker_loop(shared: Arc<Shared>, worker_id: usize) {
    WORKER_OF.with(|w| w.set(Arc::as_ptr(&shared) as usize));
    debug!(worker = worker_id, "worker started");
    loop {
        let job = match shared.pop() {
            Some(job) => job,
            None => {
                let token = shared.not_empty.prepare();
                match shared.pop() {
                    Some(job) => job,
                    None if shared.is_shutdown() => break,
                    None => {
                        shared.not_empty.park(token, None);
                        continue;
                    }
                }
            }
        };
        let id = job.id;
        if let Some(Err(e)) = shared.execute(job) {
            error!(worker = worker_id, task_id = %id, error = %e, "work item failed");
        }
    }
    debug!(worker = worker_id, "worker stopped");
}
