use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of work: a tag for log correlation and the command to run.
///
/// The tag is derived from the jobfile's base name and is not guaranteed
/// unique across a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub tag: String,
    pub command: String,
}

impl TaskSpec {
    pub fn new(tag: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            command: command.into(),
        }
    }

    /// Build a task that executes the given jobfile directly.
    ///
    /// The jobfile must be independently executable (it carries its own
    /// interpreter line). Existence and permissions are not checked here;
    /// a missing or non-executable file surfaces as a nonzero exit status
    /// once the pool runs it.
    pub fn from_jobfile(jobfile: impl AsRef<Path>) -> Self {
        let jobfile = jobfile.as_ref();
        let tag = jobfile
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| jobfile.to_string_lossy().into_owned());
        Self {
            tag,
            command: jobfile.to_string_lossy().into_owned(),
        }
    }
}

/// Opaque handle identifying one queue entry. A resubmitted task gets a
/// fresh handle; the spec alone does not identify an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle(Uuid);

impl TaskHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A task as handed back by `DispatchQueue::wait`: the original spec plus
/// captured output and exit status. Read-only to the control loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedTask {
    pub spec: TaskSpec,
    pub output: String,
    pub return_status: i32,
    pub completed_at: DateTime<Utc>,
}

impl CompletedTask {
    pub fn new(spec: TaskSpec, output: String, return_status: i32) -> Self {
        Self {
            spec,
            output,
            return_status,
            completed_at: Utc::now(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.spec.tag
    }

    pub fn succeeded(&self) -> bool {
        self.return_status == 0
    }
}
