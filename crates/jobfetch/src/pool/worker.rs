use super::request::WorkRequest;
use crate::{JobFetcher, dispatch::execute_unit};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Worker task responsible for processing [`WorkRequest`] messages.
///
/// Each worker shares the read-only [`JobFetcher`] and executes one unit at a
/// time: every job index of a batch is fetched sequentially, in index order,
/// before the next message is received. The loop runs until a
/// [`WorkRequest::Shutdown`] arrives or every sender is dropped.
///
/// # Arguments
///
/// - `worker_id`: Identifier for this worker (used for logs/tracing).
/// - `rx`: Receiver through which [`WorkRequest`]s are received.
/// - `fetcher`: Shared fetcher used for every job index.
/// - `cancel`: Run-wide cancellation token checked between and during
///   requests.
pub async fn worker_loop<F: JobFetcher>(
    worker_id: usize,
    mut rx: mpsc::Receiver<WorkRequest>,
    fetcher: Arc<F>,
    cancel: CancellationToken,
) {
    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} started");

    while let Some(work) = rx.recv().await {
        match work {
            WorkRequest::Batch {
                unit_id,
                range,
                report_tx,
            } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} running unit {unit_id} ({range:?})");

                let report = execute_unit(unit_id, range, fetcher.as_ref(), &cancel).await;

                if let Err(_e) = report_tx.send(report).await {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} failed to report unit {unit_id}: {_e}");
                }
            }
            WorkRequest::Shutdown { response } => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Worker {worker_id} received shutdown signal");

                if response.send(()).is_err() {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Worker {worker_id} failed to acknowledge shutdown");
                }
                break;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {worker_id} stopped");
    #[cfg(not(feature = "tracing"))]
    let _ = worker_id;
}
