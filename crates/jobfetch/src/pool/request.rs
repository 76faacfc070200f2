use crate::dispatch::UnitReport;
use core::ops::Range;
use tokio::sync::{mpsc, oneshot};

/// Messages accepted by a pool worker.
#[derive(Debug)]
pub enum WorkRequest {
    /// Execute every job index in `range`, in order, and send the resulting
    /// [`UnitReport`] on `report_tx`.
    Batch {
        unit_id: usize,
        range: Range<usize>,
        report_tx: mpsc::Sender<UnitReport>,
    },
    /// Stop the worker and acknowledge on `response`.
    Shutdown { response: oneshot::Sender<()> },
}
