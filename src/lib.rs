pub mod batch;
pub mod config;
pub mod error;
pub mod queue;
pub mod script;
pub mod task;

pub use batch::{BatchReport, BatchRunner};
pub use config::{parse_poll_interval, QueueConfig, ScheduleAlg, WaitOptions, WorkerMode};
pub use error::{BatchError, Result};
pub use queue::{DispatchQueue, LocalPool, QueueStats};
pub use task::{CompletedTask, TaskHandle, TaskSpec};
