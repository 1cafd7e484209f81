use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::{QueueConfig, ScheduleAlg};
use crate::error::{BatchError, Result};
use crate::queue::executor::TaskExecutor;
use crate::queue::{DispatchQueue, QueueStats};
use crate::task::{CompletedTask, TaskHandle, TaskSpec};

/// Shared counters behind the `stats()` snapshot. Each field is sampled
/// independently; a snapshot taken mid-transition may be momentarily
/// inconsistent across fields, which callers must tolerate.
#[derive(Debug, Default)]
struct PoolCounters {
    workers_init: AtomicUsize,
    workers_ready: AtomicUsize,
    workers_busy: AtomicUsize,
    tasks_running: AtomicUsize,
    tasks_waiting: AtomicUsize,
    tasks_complete: AtomicUsize,
}

/// In-process dispatch pool.
///
/// Binds the master port at construction (so a second master on the same
/// port fails fast), then spawns `config.workers` worker tasks that pull
/// specs from a shared channel, execute them via [`TaskExecutor`], and
/// push completions into the channel `wait` drains. Completions surface
/// in completion order, not submission order.
///
/// Remote worker attachment and catalog registration are outside this
/// backend's scope; the port is reserved and the pool identity logged so
/// operators can see what a worker would attach to.
#[derive(Debug)]
pub struct LocalPool {
    spec_tx: mpsc::UnboundedSender<TaskSpec>,
    done_rx: mpsc::UnboundedReceiver<CompletedTask>,
    /// Tasks submitted but not yet handed back out of `wait`.
    outstanding: usize,
    counters: Arc<PoolCounters>,
    listener: TcpListener,
    _workers: Vec<JoinHandle<()>>,
}

impl LocalPool {
    /// Construct the pool. Fails if the master port cannot be bound.
    pub async fn new(config: QueueConfig) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", config.port))
            .await
            .map_err(|source| BatchError::Bind {
                port: config.port,
                source,
            })?;

        tracing::info!(
            name = %config.name,
            port = config.port,
            catalog = config.catalog,
            exclusive = config.exclusive,
            algorithm = %config.algorithm,
            worker_mode = %config.worker_mode,
            workers = config.workers,
            "Dispatch pool started"
        );

        if config.algorithm == ScheduleAlg::Locality {
            tracing::debug!("in-process workers have no data placement; tasks run in FCFS order");
        }

        let worker_count = config.workers.max(1);
        let counters = Arc::new(PoolCounters::default());
        counters.workers_init.store(worker_count, Ordering::Relaxed);

        let (spec_tx, spec_rx) = mpsc::unbounded_channel::<TaskSpec>();
        let (done_tx, done_rx) = mpsc::unbounded_channel::<CompletedTask>();

        let spec_rx = Arc::new(Mutex::new(spec_rx));
        let workers = (0..worker_count)
            .map(|worker_id| {
                let spec_rx = Arc::clone(&spec_rx);
                let done_tx = done_tx.clone();
                let counters = Arc::clone(&counters);
                tokio::spawn(worker_loop(worker_id, spec_rx, done_tx, counters))
            })
            .collect();

        Ok(Self {
            spec_tx,
            done_rx,
            outstanding: 0,
            counters,
            listener,
            _workers: workers,
        })
    }

    /// Address the master port is bound to. Useful with a configured port
    /// of 0, where the OS picks one.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }
}

async fn worker_loop(
    worker_id: usize,
    spec_rx: Arc<Mutex<mpsc::UnboundedReceiver<TaskSpec>>>,
    done_tx: mpsc::UnboundedSender<CompletedTask>,
    counters: Arc<PoolCounters>,
) {
    let executor = TaskExecutor::new();

    counters.workers_init.fetch_sub(1, Ordering::Relaxed);
    counters.workers_ready.fetch_add(1, Ordering::Relaxed);
    tracing::debug!(worker_id, "Worker ready");

    loop {
        // Lock only for the dequeue so idle workers do not serialize
        // running tasks.
        let spec = { spec_rx.lock().await.recv().await };
        let Some(spec) = spec else {
            break;
        };

        counters.tasks_waiting.fetch_sub(1, Ordering::Relaxed);
        counters.workers_ready.fetch_sub(1, Ordering::Relaxed);
        counters.workers_busy.fetch_add(1, Ordering::Relaxed);
        counters.tasks_running.fetch_add(1, Ordering::Relaxed);

        let completed = executor.execute(spec).await;

        counters.tasks_running.fetch_sub(1, Ordering::Relaxed);
        counters.workers_busy.fetch_sub(1, Ordering::Relaxed);
        counters.workers_ready.fetch_add(1, Ordering::Relaxed);
        counters.tasks_complete.fetch_add(1, Ordering::Relaxed);

        if done_tx.send(completed).is_err() {
            break;
        }
    }

    counters.workers_ready.fetch_sub(1, Ordering::Relaxed);
    tracing::debug!(worker_id, "Worker stopped");
}

impl DispatchQueue for LocalPool {
    fn submit(&mut self, spec: TaskSpec) -> TaskHandle {
        let handle = TaskHandle::new();
        tracing::debug!(tag = %spec.tag, %handle, "Task submitted");

        self.counters.tasks_waiting.fetch_add(1, Ordering::Relaxed);
        self.outstanding += 1;
        if self.spec_tx.send(spec).is_err() {
            // All workers exited; the task can never run. Surfaced on the
            // next `wait` as a permanently empty window.
            tracing::warn!("Dispatch pool workers are gone; task dropped");
        }
        handle
    }

    async fn wait(&mut self, timeout: Duration) -> Option<CompletedTask> {
        match tokio::time::timeout(timeout, self.done_rx.recv()).await {
            Ok(Some(task)) => {
                self.outstanding -= 1;
                Some(task)
            }
            Ok(None) => {
                tracing::warn!("Completion channel closed");
                None
            }
            Err(_) => None,
        }
    }

    fn empty(&self) -> bool {
        self.outstanding == 0
    }

    fn stats(&self) -> QueueStats {
        QueueStats {
            workers_init: self.counters.workers_init.load(Ordering::Relaxed),
            workers_ready: self.counters.workers_ready.load(Ordering::Relaxed),
            workers_busy: self.counters.workers_busy.load(Ordering::Relaxed),
            tasks_running: self.counters.tasks_running.load(Ordering::Relaxed),
            tasks_waiting: self.counters.tasks_waiting.load(Ordering::Relaxed),
            tasks_complete: self.counters.tasks_complete.load(Ordering::Relaxed),
        }
    }
}
