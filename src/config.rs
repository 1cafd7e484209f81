use std::time::Duration;

use crate::error::{BatchError, Result};

/// Scheduling algorithm the dispatch pool uses to place tasks on workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScheduleAlg {
    /// First-come-first-served: tasks run in submission order.
    #[default]
    Fcfs,
    /// Prefer workers already holding the task's input data.
    Locality,
}

impl std::fmt::Display for ScheduleAlg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleAlg::Fcfs => write!(f, "fcfs"),
            ScheduleAlg::Locality => write!(f, "locality"),
        }
    }
}

/// Whether workers may serve other masters while attached to this pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerMode {
    #[default]
    Shared,
    Exclusive,
}

impl std::fmt::Display for WorkerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerMode::Shared => write!(f, "shared"),
            WorkerMode::Exclusive => write!(f, "exclusive"),
        }
    }
}

/// Configuration for the dispatch pool, fixed at construction.
///
/// The original system took these as an open keyword bag and mutated a
/// process-wide debug flag; here every recognized option is an explicit
/// field with a documented default, and `debug` is applied once to the
/// tracing subscriber before the pool is built.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Port the dispatch master listens on for worker attachment.
    pub port: u16,
    /// Pool identity, advertised to the catalog when `catalog` is set.
    pub name: String,
    /// Register this pool with the discovery service.
    pub catalog: bool,
    /// Reserve attached workers exclusively for this pool.
    pub exclusive: bool,
    /// Task placement algorithm.
    pub algorithm: ScheduleAlg,
    /// Worker sharing mode.
    pub worker_mode: WorkerMode,
    /// Number of in-process workers the local pool spawns.
    pub workers: usize,
    /// Verbosity directive for the tracing subscriber ("all" enables
    /// debug-level output for the whole crate). Immutable after init.
    pub debug: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            port: 9123,
            name: "workbatch".to_string(),
            catalog: true,
            exclusive: false,
            algorithm: ScheduleAlg::Fcfs,
            worker_mode: WorkerMode::Shared,
            workers: 4,
            debug: "all".to_string(),
        }
    }
}

/// Options for the batch wait loop.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    /// Maximum time one `wait` call blocks before the loop re-checks its
    /// termination conditions.
    pub poll_interval: Duration,
    /// Retry budget shared across the whole batch. `None` means unbounded.
    pub max_tries: Option<u32>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            max_tries: None,
        }
    }
}

/// Parse a poll interval string: an unsigned integer followed by one of
/// `s`, `m`, `h`, `d`, `w` (seconds through weeks). Example: `"1m"`.
pub fn parse_poll_interval(s: &str) -> Result<Duration> {
    let err = || BatchError::InvalidPollInterval(s.to_string());

    let Some((unit_idx, _)) = s.char_indices().last() else {
        return Err(err());
    };
    let (digits, unit) = s.split_at(unit_idx);
    let value: u64 = digits.parse().map_err(|_| err())?;

    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        "w" => 60 * 60 * 24 * 7,
        _ => return Err(err()),
    };

    let secs = value.checked_mul(unit_secs).ok_or_else(err)?;
    Ok(Duration::from_secs(secs))
}
