mod fake_queue;

use std::time::Duration;

use fake_queue::ScriptedQueue;
use workbatch::{BatchRunner, DispatchQueue, WaitOptions};

fn opts(max_tries: Option<u32>) -> WaitOptions {
    WaitOptions {
        poll_interval: Duration::from_millis(10),
        max_tries,
    }
}

#[tokio::test]
async fn test_all_success_batch() {
    let queue = ScriptedQueue::new()
        .script("a.sh", &[0])
        .script("b.sh", &[0])
        .script("c.sh", &[0]);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/jobs/a.sh", "/jobs/b.sh", "/jobs/c.sh"]);
    assert!(runner.is_running());

    let report = runner.wait(&opts(None)).await;

    assert!(report.success);
    assert_eq!(report.retries, 0);
    assert!(report.failed.is_empty());
    assert!(!runner.is_running());
    assert_eq!(runner.queue().stats().tasks_complete, 3);
}

#[tokio::test]
async fn test_success_latches_false_even_when_retry_succeeds() {
    // A fails on first attempt, succeeds on resubmission; B is clean.
    let queue = ScriptedQueue::new()
        .script("a.sh", &[1, 0])
        .script("b.sh", &[0]);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/jobs/a.sh", "/jobs/b.sh"]);
    let report = runner.wait(&opts(None)).await;

    assert!(!report.success);
    assert_eq!(report.retries, 1);
    assert_eq!(report.failed, vec!["a.sh"]);
    // The batch still drained: the retry ran to completion.
    assert!(!runner.is_running());
}

#[tokio::test]
async fn test_retry_budget_exhaustion_abandons_outstanding_task() {
    let queue = ScriptedQueue::new().script_always("a.sh", 1);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/jobs/a.sh"]);
    let report = runner.wait(&opts(Some(2))).await;

    assert!(!report.success);
    assert_eq!(report.retries, 2);
    assert_eq!(report.failed, vec!["a.sh", "a.sh"]);
    // Two resubmissions happened, and the last one is still in the queue.
    assert_eq!(runner.queue().submissions.len(), 3);
    assert_eq!(runner.queue().outstanding(), 1);
    assert!(runner.is_running());
}

#[tokio::test]
async fn test_empty_windows_change_no_state() {
    let queue = ScriptedQueue::new()
        .script("a.sh", &[0])
        .with_stall_windows(3);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/jobs/a.sh"]);
    let report = runner.wait(&opts(Some(5))).await;

    assert!(report.success);
    assert_eq!(report.retries, 0);
    assert!(report.failed.is_empty());
    // Three empty windows plus the one that delivered the completion.
    assert_eq!(runner.queue().wait_calls, 4);
}

#[tokio::test]
async fn test_loop_exits_immediately_on_empty_queue() {
    let mut runner = BatchRunner::new(ScriptedQueue::new());

    let report = runner.wait(&opts(None)).await;

    assert!(report.success);
    assert_eq!(report.retries, 0);
    assert_eq!(runner.queue().wait_calls, 0);
}

#[tokio::test]
async fn test_failed_lists_every_failing_completion() {
    // A fails twice before succeeding; tags repeat per failing attempt.
    let queue = ScriptedQueue::new()
        .script("a.sh", &[1, 1, 0])
        .script("b.sh", &[0]);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/jobs/a.sh", "/jobs/b.sh"]);
    let report = runner.wait(&opts(None)).await;

    assert!(!report.success);
    assert_eq!(report.retries, 2);
    assert_eq!(report.failed, vec!["a.sh", "a.sh"]);
}

#[tokio::test]
async fn test_submit_builds_specs_from_jobfile_paths() {
    let queue = ScriptedQueue::new().script("run.sh", &[0]);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/data/jobs/run.sh"]);

    let submitted = &runner.queue().submissions;
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].tag, "run.sh");
    assert_eq!(submitted[0].command, "/data/jobs/run.sh");
}

#[tokio::test]
async fn test_resubmission_reuses_spec_as_fresh_entry() {
    let queue = ScriptedQueue::new().script("a.sh", &[1, 0]);
    let mut runner = BatchRunner::new(queue);

    runner.submit_jobs(["/jobs/a.sh"]);
    runner.wait(&opts(None)).await;

    let submitted = &runner.queue().submissions;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0], submitted[1]);
}
