//! Bounded worker pool owned by a simulation session
//!
//! Wraps a dedicated rayon pool so partitioned work can borrow frame data
//! through `scope` and the caller blocks until every partition is done.
//! Each task catches its own panic; failures are collected and the one
//! with the lowest range start is reported after the barrier.
//!
//! Teardown is bounded: dropping the rayon pool asks the workers to finish,
//! then we wait up to `shutdown_timeout` for their exit notifications.
//! Workers still alive after the deadline are abandoned (detached) and
//! logged; the session never blocks on them.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Errors from the worker pool
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed to build worker pool: {0}")]
    Build(#[from] rayon::ThreadPoolBuildError),
    #[error("worker pool has been shut down")]
    ShutDown,
    #[error("{failed} task(s) failed, first: {first}")]
    TaskPanicked {
        #[source]
        first: TaskFailure,
        failed: usize,
    },
}

/// A partition whose task panicked
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("partition {start}..{end} panicked: {message}")]
pub struct TaskFailure {
    pub start: usize,
    pub end: usize,
    pub message: String,
}

/// Result of a bounded shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker exited before the deadline
    Graceful,
    /// Deadline expired; this many workers were abandoned
    TimedOut { abandoned: usize },
    AlreadyStopped,
}

/// One worker per core minus the simulation thread, never fewer than two
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(2)
}

pub struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
    exits: Receiver<usize>,
    threads: usize,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    pub fn new(threads: usize, shutdown_timeout: Duration) -> Result<Self, PoolError> {
        let threads = threads.max(1);
        let (exit_tx, exit_rx) = unbounded();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("avoidance-{}", i))
            .exit_handler(move |i| {
                // Receiver may already be gone if the session was torn down
                let _ = exit_tx.send(i);
            })
            .build()?;

        info!("Worker pool started with {} threads", threads);

        Ok(Self {
            pool: Some(pool),
            exits: exit_rx,
            threads,
            shutdown_timeout,
        })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_some()
    }

    /// Run `op` on every item, one task per contiguous `batch`-sized range
    ///
    /// `op` receives the item's index in `items`. Returns after every task
    /// has finished, even if some of them panicked.
    pub fn for_each_partition<T, F>(&self, items: &mut [T], batch: usize, op: F) -> Result<(), PoolError>
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync,
    {
        let pool = self.pool.as_ref().ok_or(PoolError::ShutDown)?;
        let batch = batch.max(1);
        let failures: Mutex<Vec<TaskFailure>> = Mutex::new(Vec::new());
        let op = &op;
        let failures_ref = &failures;

        pool.scope(move |scope| {
            for (chunk_index, chunk) in items.chunks_mut(batch).enumerate() {
                let start = chunk_index * batch;
                scope.spawn(move |_| {
                    let end = start + chunk.len();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        for (offset, item) in chunk.iter_mut().enumerate() {
                            op(start + offset, item);
                        }
                    }));
                    if let Err(payload) = outcome {
                        failures_ref.lock().push(TaskFailure {
                            start,
                            end,
                            message: panic_message(payload.as_ref()),
                        });
                    }
                });
            }
        });

        let mut failures = failures.into_inner();
        let failed = failures.len();
        failures.sort_by_key(|f| f.start);
        match failures.into_iter().next() {
            Some(first) => Err(PoolError::TaskPanicked { first, failed }),
            None => Ok(()),
        }
    }

    /// Stop the workers, waiting at most `shutdown_timeout`
    pub fn shutdown(&mut self) -> ShutdownOutcome {
        let Some(pool) = self.pool.take() else {
            return ShutdownOutcome::AlreadyStopped;
        };
        drop(pool);

        let deadline = Instant::now() + self.shutdown_timeout;
        let mut exited = 0;
        while exited < self.threads {
            match self.exits.recv_deadline(deadline) {
                Ok(_) => exited += 1,
                // All exit handlers are gone, so every worker has finished
                Err(RecvTimeoutError::Disconnected) => exited = self.threads,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        if exited < self.threads {
            let abandoned = self.threads - exited;
            warn!(
                "Worker pool shutdown timed out after {:?}, abandoning {} worker(s)",
                self.shutdown_timeout, abandoned
            );
            ShutdownOutcome::TimedOut { abandoned }
        } else {
            debug!("Worker pool stopped ({} threads)", self.threads);
            ShutdownOutcome::Graceful
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
