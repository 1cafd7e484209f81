use std::process::Stdio;

use tokio::process::Command;

use crate::task::{CompletedTask, TaskSpec};

/// Executes one task command via the shell and captures its output.
///
/// Jobfiles are expected to be self-contained executables (they carry
/// their own interpreter line); a missing or non-executable file shows up
/// as the shell's nonzero exit status, not as an error here.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutor;

impl TaskExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run the task to completion and return it with output and exit
    /// status filled in.
    pub async fn execute(&self, spec: TaskSpec) -> CompletedTask {
        tracing::debug!(tag = %spec.tag, command = %spec.command, "Executing task");

        let result = Command::new("sh")
            .arg("-c")
            .arg(&spec.command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr);
                if !stderr.is_empty() {
                    text.push_str(&stderr);
                }
                // Killed by signal leaves no exit code; report it as -1 so
                // the retry controller still sees a failure.
                let return_status = output.status.code().unwrap_or(-1);

                tracing::debug!(
                    tag = %spec.tag,
                    return_status,
                    "Task completed"
                );

                CompletedTask::new(spec, text, return_status)
            }
            Err(e) => {
                tracing::warn!(tag = %spec.tag, error = %e, "Failed to spawn task");
                CompletedTask::new(spec, format!("spawn failed: {}", e), 127)
            }
        }
    }
}
