//! Scripted dispatch queue for deterministic control-loop tests.
//!
//! Each tag carries a script of exit statuses; every submission of that
//! tag consumes the next one and makes a completion available to `wait`.
//! A tag with an exhausted (or absent) script stays outstanding forever,
//! and the queue can be told to serve a number of empty windows first.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use workbatch::{CompletedTask, DispatchQueue, QueueStats, TaskHandle, TaskSpec};

enum Script {
    Seq(VecDeque<i32>),
    Always(i32),
}

impl Script {
    fn next(&mut self) -> Option<i32> {
        match self {
            Script::Seq(codes) => codes.pop_front(),
            Script::Always(code) => Some(*code),
        }
    }
}

#[derive(Default)]
pub struct ScriptedQueue {
    scripts: HashMap<String, Script>,
    ready: VecDeque<CompletedTask>,
    stall_windows: u32,
    outstanding: usize,
    delivered: usize,
    pub submissions: Vec<TaskSpec>,
    pub wait_calls: u32,
}

impl ScriptedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successive exit statuses for a tag, one per submission.
    pub fn script(mut self, tag: &str, codes: &[i32]) -> Self {
        self.scripts
            .insert(tag.to_string(), Script::Seq(codes.iter().copied().collect()));
        self
    }

    /// Every submission of this tag completes with the same status.
    pub fn script_always(mut self, tag: &str, code: i32) -> Self {
        self.scripts.insert(tag.to_string(), Script::Always(code));
        self
    }

    /// Serve this many empty `wait` windows before handing out completions.
    pub fn with_stall_windows(mut self, n: u32) -> Self {
        self.stall_windows = n;
        self
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

impl DispatchQueue for ScriptedQueue {
    fn submit(&mut self, spec: TaskSpec) -> TaskHandle {
        self.submissions.push(spec.clone());
        self.outstanding += 1;

        if let Some(script) = self.scripts.get_mut(&spec.tag) {
            if let Some(code) = script.next() {
                let output = if code == 0 { "DONE\n" } else { "FAILURE\n" };
                self.ready
                    .push_back(CompletedTask::new(spec, output.to_string(), code));
            }
        }

        TaskHandle::new()
    }

    async fn wait(&mut self, _timeout: Duration) -> Option<CompletedTask> {
        self.wait_calls += 1;

        if self.stall_windows > 0 {
            self.stall_windows -= 1;
            return None;
        }

        let task = self.ready.pop_front();
        if task.is_some() {
            self.outstanding -= 1;
            self.delivered += 1;
        }
        task
    }

    fn empty(&self) -> bool {
        self.outstanding == 0
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            workers_init: 0,
            workers_ready: 1,
            workers_busy: 0,
            tasks_running: 0,
            tasks_waiting: self.outstanding - self.ready.len(),
            tasks_complete: self.delivered,
        }
    }
}
