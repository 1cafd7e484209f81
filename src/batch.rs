//! Batch submission and the wait/retry control loop.
//!
//! This is the heart of the crate: submit a batch of jobfiles, then poll
//! the dispatch queue with a bounded wait, resubmitting failures until the
//! queue drains or the shared retry budget runs out.

use std::path::Path;

use serde::Serialize;

use crate::config::WaitOptions;
use crate::queue::DispatchQueue;
use crate::task::TaskSpec;

/// Outcome of one batch.
///
/// `success` uses latched-false semantics: it goes false at the first
/// failing completion and is never reset, even when a retry of that task
/// later succeeds. `failed` records the tag of every failing completion
/// (tags are not unique, and a task failing twice appears twice), so a
/// caller can tell a clean run from a retried-into-success one without
/// changing what the boolean means.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub retries: u32,
    pub failed: Vec<String>,
}

/// Drives a batch through a [`DispatchQueue`].
///
/// The queue is injected so the loop can run against the real pool or a
/// scripted stand-in; the runner itself is single-threaded and keeps the
/// retry counter and success latch as plain locals during `wait`.
#[derive(Debug)]
pub struct BatchRunner<Q> {
    queue: Q,
}

impl<Q: DispatchQueue> BatchRunner<Q> {
    pub fn new(queue: Q) -> Self {
        Self { queue }
    }

    /// Build a task per jobfile and submit them all. Fire-and-forget; any
    /// problem with a jobfile surfaces later as a failing completion.
    pub fn submit_jobs<I, P>(&mut self, jobfiles: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for jobfile in jobfiles {
            let spec = TaskSpec::from_jobfile(jobfile);
            tracing::info!(tag = %spec.tag, command = %spec.command, "Submitting task");
            self.queue.submit(spec);
        }
    }

    /// True while any task is queued or in flight.
    pub fn is_running(&self) -> bool {
        !self.queue.empty()
    }

    /// Poll the queue until it drains or the retry budget is exhausted.
    ///
    /// Each iteration blocks at most `opts.poll_interval` in the queue's
    /// `wait`, then emits a stats snapshot. A completed task with nonzero
    /// status is resubmitted as a fresh entry and counted against the
    /// shared budget; with `max_tries: Some(n)` the loop exits once `n`
    /// resubmissions have happened, abandoning whatever is still
    /// outstanding. An empty window changes no state.
    pub async fn wait(&mut self, opts: &WaitOptions) -> BatchReport {
        let mut retries: u32 = 0;
        let mut success = true;
        let mut failed = Vec::new();

        loop {
            if self.queue.empty() {
                break;
            }
            if let Some(max) = opts.max_tries {
                if retries >= max {
                    tracing::warn!(retries, "Retry budget exhausted, abandoning batch");
                    break;
                }
            }

            let task = self.queue.wait(opts.poll_interval).await;

            let stats = self.queue.stats();
            tracing::info!(
                workers_init = stats.workers_init,
                workers_ready = stats.workers_ready,
                workers_busy = stats.workers_busy,
                tasks_running = stats.tasks_running,
                tasks_waiting = stats.tasks_waiting,
                tasks_complete = stats.tasks_complete,
                "Queue stats"
            );

            if let Some(task) = task {
                tracing::info!(
                    tag = %task.tag(),
                    return_status = task.return_status,
                    output = %task.output.trim_end(),
                    "Task finished"
                );

                success = success && task.succeeded();

                if !task.succeeded() {
                    failed.push(task.tag().to_string());
                    // Same spec, fresh queue entry; the failed attempt's
                    // output and status are discarded.
                    self.queue.submit(task.spec.clone());
                    retries += 1;
                }
            }
        }

        BatchReport {
            success,
            retries,
            failed,
        }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }
}
