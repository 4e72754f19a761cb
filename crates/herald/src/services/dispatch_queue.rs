//! Dispatch Queue - serialized executor for outbound platform calls
//!
//! Every write to the chat platform goes through one FIFO drained by a single
//! worker, so the process never has two outbound calls in flight. A task that
//! fails or panics only affects its own caller; the worker moves on.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::domain::errors::RelayError;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Dispatch queue configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of tasks waiting behind the running one
    pub capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

pub struct DispatchQueue {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    capacity: usize,
}

impl DispatchQueue {
    /// Create the queue and spawn its worker. Must be called inside a Tokio runtime.
    pub fn new(config: DispatchConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_worker(rx));
        Self {
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks accepted but not yet started
    pub fn pending(&self) -> usize {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0)
    }

    /// Append `task` to the queue.
    ///
    /// The task is queued before this returns, so enqueue order is call
    /// order. The returned future resolves with the task's own result.
    pub fn enqueue<T, F, Fut>(
        &self,
        label: &'static str,
        task: F,
    ) -> impl Future<Output = Result<T, RelayError>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RelayError>> + Send + 'static,
        T: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let enqueued_at = Instant::now();

        let job: Job = Box::new(move || {
            async move {
                debug!(
                    task = label,
                    waited_ms = enqueued_at.elapsed().as_millis() as u64,
                    "Dispatching task"
                );
                // Caller may have stopped waiting
                let _ = done_tx.send(task().await);
            }
            .boxed()
        });

        let accepted = match self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            Some(tx) => tx.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => RelayError::QueueFull {
                    capacity: self.capacity,
                },
                mpsc::error::TrySendError::Closed(_) => RelayError::QueueClosed,
            }),
            None => Err(RelayError::QueueClosed),
        };

        if let Err(e) = &accepted {
            warn!(task = label, error = %e, "Dispatch rejected");
        }

        async move {
            accepted?;
            done_rx
                .await
                .map_err(|_| RelayError::QueueTask(format!("{label} aborted before completing")))?
        }
    }

    /// Stop accepting tasks and wait for the queued ones to finish.
    pub async fn shutdown(&self) {
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

async fn run_worker(mut rx: mpsc::Receiver<Job>) {
    while let Some(job) = rx.recv().await {
        // Run on its own task so a panic cannot take the worker down
        if let Err(e) = tokio::spawn(job()).await {
            warn!(error = %e, "Dispatched task panicked");
        }
    }
    debug!("Dispatch worker stopped");
}
