//! Dispatch queue interface and the in-process pool backend.
//!
//! The control loop in [`crate::batch`] only sees the [`DispatchQueue`]
//! trait: submit a task, wait a bounded time for one completion, ask
//! whether anything is still in flight, and snapshot pool statistics.
//! [`pool::LocalPool`] is the shipped backend; tests drive the loop with a
//! scripted queue instead.

pub mod executor;
pub mod pool;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::{CompletedTask, TaskHandle, TaskSpec};

pub use pool::LocalPool;

/// Point-in-time snapshot of pool state. Polled, not pushed; fields are
/// sampled independently and may not be mutually consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub workers_init: usize,
    pub workers_ready: usize,
    pub workers_busy: usize,
    pub tasks_running: usize,
    pub tasks_waiting: usize,
    pub tasks_complete: usize,
}

/// The pool that accepts task specs and runs them on workers.
///
/// `wait` must return within the given timeout even when nothing has
/// completed, so the caller can re-check its termination conditions.
pub trait DispatchQueue {
    /// Enqueue a task for execution. Non-blocking.
    fn submit(&mut self, spec: TaskSpec) -> TaskHandle;

    /// Block up to `timeout` for one completed task. `None` means nothing
    /// finished within the window.
    fn wait(
        &mut self,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Option<CompletedTask>> + Send;

    /// True iff no tasks are queued or in flight. A task that completed but
    /// has not yet been handed out by `wait` still counts as in flight.
    fn empty(&self) -> bool;

    /// Snapshot of current pool statistics.
    fn stats(&self) -> QueueStats;
}
