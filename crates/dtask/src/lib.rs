//! # dtask - Deferred Task Scheduling
//!
//! Run a callback after a delay, or hand work to a fixed pool of worker
//! threads, or both: a delayed callback that submits to the pool.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use dtask::{Scheduler, SchedulerConfig};
//!
//! fn main() -> dtask::DTaskResult<()> {
//!     dtask::init_logging();
//!     let scheduler = Scheduler::new(SchedulerConfig::from_env().num_workers(4))?;
//!
//!     // Deferred callback
//!     let timer = scheduler.after(Duration::from_millis(100), || println!("tick"))?;
//!
//!     // Fire-and-forget work
//!     scheduler.submit(|| println!("on a worker"))?;
//!
//!     // Combine: delayed callback submitting to the pool
//!     let handle = scheduler.handle();
//!     scheduler.after(Duration::from_millis(50), move || {
//!         let _ = handle.submit(|| println!("write response"));
//!     })?;
//!
//!     scheduler.cancel(timer);
//!     scheduler.wait_idle(Duration::from_secs(1));
//!     let stats = scheduler.shutdown();
//!     println!("{:?}", stats);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   after()/at()                       submit()
//!        │                                │
//!        ▼                                ▼
//!   ┌──────────┐  due   ┌────────┐  ┌──────────────────┐
//!   │DelayQueue│ ─────► │ poller │─►│ bounded FIFO (C) │
//!   └──────────┘        └────────┘  └──────────────────┘
//!                           │ full        │   │   │
//!                           ▼             ▼   ▼   ▼
//!                       run inline      worker × N
//! ```
//!
//! ## Environment
//!
//! `SchedulerConfig::from_env()` reads `DTASK_NUM_WORKERS`,
//! `DTASK_QUEUE_CAPACITY`, `DTASK_QUEUE_FULL`, `DTASK_POLL_STRATEGY`,
//! `DTASK_FIRE_MODE`, `DTASK_MAX_TIMERS`, `DTASK_MAX_PARK_MS` and
//! `DTASK_THREAD_PREFIX`. `init_logging()` reads `DTASK_LOG`.

mod logging;

pub use logging::{init_logging, LOG_ENV};

// Re-export core types
pub use dtask_core::{panic_message, DTaskError, DTaskResult, Task, TaskId};

// Re-export env utilities
pub use dtask_core::{env_get, env_get_millis, env_get_opt};

// Re-export runtime types
pub use dtask_runtime::{
    DelayQueue,
    FireMode,
    PollStrategy,
    PollerStats,
    PoolConfig,
    PoolStats,
    QueueFullPolicy,
    ResultHandle,
    Scheduler,
    SchedulerConfig,
    SchedulerHandle,
    SchedulerStats,
    TaskHandle,
    TaskState,
    TimerBackendType,
    TimerHandle,
    WorkerPool,
};
