//! # dtask-runtime
//!
//! Thread-based runtime for the dtask deferred scheduler.
//!
//! This crate provides:
//! - Configuration with environment overrides
//! - Epoch-count parking used by every blocking wait
//! - Delay queue with a pluggable backend, driven by one poller thread
//! - Bounded worker pool with queue-full backpressure
//! - `Scheduler` facade composing the two

pub mod config;
pub mod parking;
pub mod timer;
pub mod pool;
pub mod scheduler;

// Re-exports
pub use config::{FireMode, PollStrategy, QueueFullPolicy, SchedulerConfig};
pub use pool::{PoolConfig, PoolStats, ResultHandle, TaskHandle, TaskState, WorkerPool};
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerStats};
pub use timer::{DelayQueue, DueTimer, PollerStats, TimerBackendType, TimerHandle};
