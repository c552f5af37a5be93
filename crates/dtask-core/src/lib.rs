//! # dtask-core
//!
//! Core types for the dtask deferred scheduler.
//!
//! This crate is platform-agnostic and spawns no threads.
//! The timer poller, worker pool and scheduler live in `dtask-runtime`.
//!
//! ## Modules
//!
//! - `error` - Error enum shared by every dtask crate
//! - `task` - Task type, task ids and panic isolation
//! - `env` - Environment variable utilities

pub mod error;
pub mod task;
pub mod env;

// Re-exports for convenience
pub use error::{DTaskError, DTaskResult};
pub use task::{panic_message, run_isolated, Task, TaskId};
pub use env::{env_get, env_get_millis, env_get_opt};

/// Limits shared by the runtime
pub mod constants {
    /// Maximum worker threads per pool
    pub const MAX_WORKERS: usize = 256;

    /// Maximum work queue capacity per pool
    pub const MAX_QUEUE_CAPACITY: usize = 1 << 20;
}
