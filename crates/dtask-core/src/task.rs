//! Units of work and panic isolation
//!
//! A `Task` is the opaque, zero-argument callback handed to the delay
//! queue or the worker pool. Whoever runs it goes through `run_isolated`
//! so a panicking callback never unwinds into a poller or worker loop.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{DTaskError, DTaskResult};

/// Fire-and-forget unit of work
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Process-unique id of a pool submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocate the next id
    #[inline]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        TaskId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Run a task, converting a panic into `DTaskError::CallbackFailed`
///
/// The caller decides how to report the failure; the task is never retried.
pub fn run_isolated(task: Task) -> DTaskResult<()> {
    panic::catch_unwind(AssertUnwindSafe(task)).map_err(|payload| DTaskError::CallbackFailed {
        message: panic_message(&*payload),
    })
}
