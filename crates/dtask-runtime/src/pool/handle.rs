//! Handles returned by pool submissions

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use dtask_core::{DTaskError, DTaskResult, TaskId};

/// Lifecycle of a pool item
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Queued, not yet picked up
    Pending = 0,
    /// A worker is executing it
    Running = 1,
    /// Ran to completion (or panicked)
    Finished = 2,
    /// Cancelled before a worker picked it up
    Cancelled = 3,
}

impl TaskState {
    #[inline]
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            2 => TaskState::Finished,
            _ => TaskState::Cancelled,
        }
    }
}

/// Shared state cell between a handle and the queued job
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(StateCell(AtomicU8::new(TaskState::Pending as u8)))
    }

    #[inline]
    pub(crate) fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Single authoritative transition out of `Pending`
    #[inline]
    pub(crate) fn transition(&self, to: TaskState) -> bool {
        self.0
            .compare_exchange(
                TaskState::Pending as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    #[inline]
    pub(crate) fn finish(&self) {
        self.0.store(TaskState::Finished as u8, Ordering::Release);
    }
}

/// Handle to a fire-and-forget pool submission
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: Arc<StateCell>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, state: Arc<StateCell>) -> Self {
        Self { id, state }
    }

    /// Submission id
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Current lifecycle state
    #[inline]
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    /// Cancel if no worker has started it yet
    ///
    /// Returns false once the item is running, finished or already
    /// cancelled. A cancelled item still occupies its queue slot until
    /// a worker dequeues and discards it.
    pub fn cancel(&self) -> bool {
        self.state.transition(TaskState::Cancelled)
    }

    /// True once the item finished or was cancelled
    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self.state(), TaskState::Finished | TaskState::Cancelled)
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Handle to a pool submission that produces a value
///
/// A panic in the work item yields `CallbackFailed`; a cancelled item
/// yields `Cancelled`.
pub struct ResultHandle<T> {
    task: TaskHandle,
    rx: Receiver<DTaskResult<T>>,
}

impl<T> ResultHandle<T> {
    pub(crate) fn new(task: TaskHandle, rx: Receiver<DTaskResult<T>>) -> Self {
        Self { task, rx }
    }

    /// Cancel if not yet started
    pub fn cancel(&self) -> bool {
        self.task.cancel()
    }

    /// Block until the item finished
    pub fn wait(self) -> DTaskResult<T> {
        self.rx.recv().unwrap_or(Err(DTaskError::Cancelled))
    }

    /// Block at most `timeout`; `None` if still not finished
    pub fn wait_timeout(&self, timeout: Duration) -> Option<DTaskResult<T>> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(DTaskError::Cancelled)),
        }
    }
}

impl<T> fmt::Debug for ResultHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultHandle").field("task", &self.task).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_only_from_pending() {
        let handle = TaskHandle::new(TaskId::next(), StateCell::new());
        assert_eq!(handle.state(), TaskState::Pending);
        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_done());
    }

    #[test]
    fn test_cancel_loses_to_running() {
        let cell = StateCell::new();
        let handle = TaskHandle::new(TaskId::next(), Arc::clone(&cell));
        assert!(cell.transition(TaskState::Running));
        assert!(!handle.cancel());
        cell.finish();
        assert_eq!(handle.state(), TaskState::Finished);
    }

    #[test]
    fn test_result_handle_disconnected_is_cancelled() {
        let (tx, rx) = std::sync::mpsc::sync_channel::<DTaskResult<u8>>(1);
        let handle = ResultHandle::new(TaskHandle::new(TaskId::next(), StateCell::new()), rx);
        assert!(handle.wait_timeout(Duration::ZERO).is_none());
        drop(tx);
        assert_eq!(handle.wait(), Err(DTaskError::Cancelled));
    }
}
