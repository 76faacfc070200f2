use crate::{JobFetcher, RequestFailure};
use core::ops::Range;
use core::time::Duration;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Terminal state of a unit.
///
/// There is no retrying state: a failure is final for its job index and the
/// unit moves on to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStatus {
    /// Every index produced a response (identifier or miss).
    Completed,
    /// At least one index failed or was cancelled.
    CompletedWithPartialFailures,
}

/// The outcome of one unit: one worker's execution of its sub-range.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub unit_id: usize,
    pub range: Range<usize>,
    /// Harvested identifiers in ascending index order.
    pub jobs: Vec<String>,
    /// Indices that answered without a usable identifier.
    pub misses: Vec<usize>,
    /// Indices that failed, with the reason.
    pub failures: Vec<(usize, RequestFailure)>,
    /// Indices never resolved because the run was cancelled.
    pub cancelled: usize,
    pub elapsed: Duration,
}

impl UnitReport {
    pub fn status(&self) -> UnitStatus {
        if self.failures.is_empty() && self.cancelled == 0 {
            UnitStatus::Completed
        } else {
            UnitStatus::CompletedWithPartialFailures
        }
    }
}

/// Executes every job index in `range` sequentially, in index order.
///
/// A failed index is recorded and the unit continues with the next one; a
/// unit never aborts early except on cancellation, in which case the
/// in-flight and remaining indices are counted as cancelled.
#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(fetcher, cancel)))]
pub async fn execute_unit<F: JobFetcher>(
    unit_id: usize,
    range: Range<usize>,
    fetcher: &F,
    cancel: &CancellationToken,
) -> UnitReport {
    let start = Instant::now();
    let mut report = UnitReport {
        unit_id,
        range: range.clone(),
        jobs: Vec::with_capacity(range.len()),
        misses: Vec::new(),
        failures: Vec::new(),
        cancelled: 0,
        elapsed: Duration::ZERO,
    };

    for index in range.clone() {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(RequestFailure::Cancelled),
            res = fetcher.fetch(index) => res,
        };

        match outcome {
            Ok(Some(job_id)) => report.jobs.push(job_id),
            Ok(None) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Job {index} returned no identifier");
                report.misses.push(index);
            }
            Err(RequestFailure::Cancelled) => {
                report.cancelled = range.end - index;
                #[cfg(feature = "tracing")]
                tracing::debug!("Unit {unit_id} cancelled with {} jobs left", report.cancelled);
                break;
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Job {index} failed: {e}");
                report.failures.push((index, e));
            }
        }
    }

    report.elapsed = start.elapsed();
    report
}
