//! Bounded pool of asynchronous workers.
//!
//! This module defines the [`WorkerPool`] struct, which owns a fixed set of
//! Tokio tasks responsible for executing [`WorkRequest`]s. Work is
//! distributed with round-robin scheduling and the pool supports coordinated
//! shutdown.
//!
//! Each worker listens on its own bounded [`mpsc::Receiver`] and executes
//! units independently. The pool size is the only concurrency control: at
//! most one unit runs per worker at any time.

use super::{request::WorkRequest, worker::worker_loop};
use crate::{Error, JobFetcher, Result};
use core::time::Duration;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::sync::CancellationToken;

/// A fixed-size pool of asynchronous workers that process [`WorkRequest`]s.
pub struct WorkerPool {
    workers: Vec<mpsc::Sender<WorkRequest>>,
    next_worker: AtomicUsize,
    shutdown_timeout: Duration,
}

impl WorkerPool {
    /// Spawns `num_workers` worker tasks on the current Tokio runtime.
    ///
    /// Every worker shares `fetcher` and observes `cancel`. Each worker's
    /// channel holds a single request: the dispatcher submits at most one
    /// unit per worker, so a deeper buffer would only cost memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolSetup`] if `num_workers` is zero or if no Tokio
    /// runtime is available to spawn onto.
    pub fn spawn<F: JobFetcher>(
        num_workers: usize,
        fetcher: Arc<F>,
        cancel: CancellationToken,
        shutdown_timeout: Duration,
    ) -> Result<Self> {
        if num_workers == 0 {
            return Err(Error::PoolSetup {
                reason: "worker pool needs at least one worker".to_string(),
            });
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|e| Error::PoolSetup {
            reason: format!("no Tokio runtime available: {e}"),
        })?;

        let mut workers = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let (tx, rx) = mpsc::channel(1);
            workers.push(tx);
            handle.spawn(worker_loop(
                worker_id,
                rx,
                Arc::clone(&fetcher),
                cancel.clone(),
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Spawned worker pool with {num_workers} workers");

        Ok(Self {
            workers,
            next_worker: AtomicUsize::new(0),
            shutdown_timeout,
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Returns the index of the next worker to receive work (round-robin).
    pub fn next_worker_index(&self) -> usize {
        self.next_worker.fetch_add(1, Ordering::Relaxed) % self.workers.len()
    }

    /// Sends a [`WorkRequest`] to the next worker in the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelError`] if the worker's channel is closed.
    pub async fn send_to_next_worker(&self, request: WorkRequest) -> Result<()> {
        let worker_idx = self.next_worker_index();
        let worker = &self.workers[worker_idx];

        match worker.send(request).await {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::ChannelError {
                context: format!("Worker {worker_idx} channel closed"),
            }),
        }
    }

    /// Gracefully shuts down all workers in the pool.
    ///
    /// Sends a [`WorkRequest::Shutdown`] to each worker and waits, up to the
    /// configured timeout per worker, for the acknowledgements. Workers that
    /// already exited are skipped.
    pub async fn shutdown(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!("Notifying all workers to shut down");
        let mut shutdown_handles = Vec::with_capacity(self.workers.len());

        for (i, worker) in self.workers.iter().enumerate() {
            let (tx, rx) = oneshot::channel();
            if let Err(_e) = worker.send(WorkRequest::Shutdown { response: tx }).await {
                #[cfg(feature = "tracing")]
                tracing::warn!("Failed to send shutdown to worker {i}: {_e}");
            } else {
                shutdown_handles.push((i, rx));
            }
        }

        let wait = self.shutdown_timeout;
        let acks = shutdown_handles.into_iter().map(|(_i, rx)| async move {
            match timeout(wait, rx).await {
                Ok(Ok(())) => {
                    #[cfg(feature = "tracing")]
                    tracing::trace!("Worker {_i} shutdown acknowledged");
                }
                Ok(Err(_e)) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {_i} returned error: {_e}");
                }
                Err(_) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Worker {_i} shutdown timed out");
                }
            }
        });

        futures::future::join_all(acks).await;

        #[cfg(feature = "tracing")]
        tracing::debug!("Worker pool shutdown complete");
    }
}
