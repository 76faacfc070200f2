//! Concurrent batch dispatcher.
//!
//! The [`Dispatcher`] partitions `[0, N)` into worker-sized sub-ranges, runs
//! one unit per non-empty sub-range on a bounded [`WorkerPool`], and folds
//! each unit's report into a single [`ResultSet`] as units complete.
//!
//! ## Responsibilities
//!
//! - Derive the effective worker count from the [`WorkerPlan`].
//! - Spawn the pool and submit one [`WorkRequest::Batch`] per sub-range.
//! - Aggregate [`UnitReport`]s through one receiver, in completion order.
//! - Absorb every per-request failure; only setup errors abort a run.

mod result;
mod unit;

pub use result::{ResultSet, RunStats};
pub use unit::{UnitReport, UnitStatus, execute_unit};

use crate::{
    HttpFetcher, JobFetcher, Result, WorkerPlan, output::write_output, partition,
    pool::{WorkRequest, WorkerPool},
};
use core::time::Duration;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How long each worker gets to acknowledge shutdown once the run is over.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Runs a batch of job indices against a [`JobFetcher`] under a bounded
/// worker pool.
pub struct Dispatcher<F> {
    fetcher: Arc<F>,
    num_requests: usize,
    plan: WorkerPlan,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
}

impl<F: JobFetcher> Dispatcher<F> {
    pub fn new(fetcher: F, num_requests: usize, plan: WorkerPlan) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            num_requests,
            plan,
            cancel: CancellationToken::new(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Threads an external cancellation token into every unit.
    ///
    /// Cancelling it stops units from issuing further requests; the run
    /// still completes and returns whatever was harvested.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub const fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Effective number of workers (and therefore sub-ranges) for this run.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPartition`] if the plan yields no
    /// workers.
    pub fn worker_count(&self) -> Result<usize> {
        self.plan.effective_workers(self.num_requests)
    }

    /// Executes the run and returns the aggregated [`ResultSet`].
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidPartition`] before any request is sent if
    ///   the plan yields no workers.
    /// - [`crate::Error::PoolSetup`] if the worker pool cannot be created.
    /// - [`crate::Error::ChannelError`] if a unit cannot be submitted to the
    ///   pool.
    ///
    /// Per-request failures are never returned; they only shrink the result
    /// set and show up in [`RunStats`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(num_requests = self.num_requests)))]
    pub async fn run(&self) -> Result<ResultSet> {
        let workers = self.worker_count()?;
        let units: Vec<_> = partition(self.num_requests, workers)?
            .into_iter()
            .filter(|range| !range.is_empty())
            .collect();

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Dispatching {} jobs across {} workers",
            self.num_requests,
            units.len()
        );

        // A child token lets a failed submission stop this run's units without
        // cancelling the caller's token.
        let cancel = self.cancel.child_token();
        let pool = WorkerPool::spawn(
            units.len(),
            Arc::clone(&self.fetcher),
            cancel.clone(),
            self.shutdown_timeout,
        )?;

        // Sized so a finished worker never waits on the aggregator.
        let (report_tx, mut report_rx) = mpsc::channel(units.len());

        for (unit_id, range) in units.iter().enumerate() {
            let request = WorkRequest::Batch {
                unit_id,
                range: range.clone(),
                report_tx: report_tx.clone(),
            };
            if let Err(e) = pool.send_to_next_worker(request).await {
                cancel.cancel();
                pool.shutdown().await;
                return Err(e);
            }
        }
        drop(report_tx);

        let mut results = ResultSet::with_capacity(self.num_requests);
        let mut reported = vec![false; units.len()];

        while let Some(report) = report_rx.recv().await {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                "Unit {} finished {:?} in {:?} ({} harvested)",
                report.unit_id,
                report.status(),
                report.elapsed,
                report.jobs.len()
            );
            reported[report.unit_id] = true;
            results.absorb(report);
        }

        // Every sender is gone, so any unit that did not report has lost its
        // worker.
        for (range, _) in units.iter().zip(&reported).filter(|(_, done)| !**done) {
            #[cfg(feature = "tracing")]
            tracing::error!("Unit for jobs {range:?} never reported");
            results.record_lost_unit(range);
        }

        pool.shutdown().await;

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Harvested {} of {} identifiers ({} misses, {} failures, {} cancelled)",
            results.stats().harvested,
            results.stats().requested,
            results.stats().misses,
            results.stats().failures,
            results.stats().cancelled
        );

        Ok(results)
    }
}

/// Settings for a complete HTTP run, from dispatch to the output document.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Endpoint base, e.g. `http://127.0.0.1:8000/getjobdetails`.
    pub base_url: String,
    pub num_requests: usize,
    pub plan: WorkerPlan,
    pub request_timeout: Duration,
    pub output_file: PathBuf,
}

/// Runs the dispatcher against `config.base_url` and persists the output
/// document once every unit has completed.
///
/// # Errors
///
/// Everything [`Dispatcher::run`] returns, plus
/// [`crate::Error::Persistence`] or [`crate::Error::Serialization`] when the
/// output document cannot be written. In that case the harvested identifiers
/// are lost.
pub async fn run(config: &RunConfig) -> Result<ResultSet> {
    run_with_cancellation(config, CancellationToken::new()).await
}

/// [`run`] with an external cancellation token.
///
/// # Errors
///
/// See [`run`].
pub async fn run_with_cancellation(
    config: &RunConfig,
    cancel: CancellationToken,
) -> Result<ResultSet> {
    let fetcher = HttpFetcher::new(config.base_url.as_str(), config.request_timeout)?;
    let results = Dispatcher::new(fetcher, config.num_requests, config.plan)
        .with_cancellation(cancel)
        .run()
        .await?;

    write_output(&config.output_file, results.jobs()).await?;

    #[cfg(feature = "tracing")]
    tracing::info!(
        "Wrote {} identifiers to {}",
        results.len(),
        config.output_file.display()
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, LoadFactor, RequestFailure, WorkerCap};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Records which indices were requested and fails the ones listed.
    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<usize>>,
        fail: HashSet<usize>,
        miss: HashSet<usize>,
    }

    impl JobFetcher for Recording {
        async fn fetch(&self, index: usize) -> core::result::Result<Option<String>, RequestFailure> {
            self.seen.lock().unwrap().push(index);
            tokio::task::yield_now().await;
            if self.fail.contains(&index) {
                Err(RequestFailure::Timeout)
            } else if self.miss.contains(&index) {
                Ok(None)
            } else {
                Ok(Some(format!("uuid-{index}")))
            }
        }
    }

    fn plan(max_threads: i64) -> WorkerPlan {
        WorkerPlan::new(LoadFactor::default(), WorkerCap::from_max_threads(max_threads))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_index_is_sent_exactly_once() {
        let dispatcher = Dispatcher::new(Recording::default(), 97, plan(8));
        let results = dispatcher.run().await.unwrap();

        let mut seen = dispatcher.fetcher.seen.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..97).collect::<Vec<_>>());
        assert_eq!(results.len(), 97);
        assert!(results.is_complete());
        assert_eq!(results.stats().units, 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn unlimited_cap_uses_one_worker_per_job() {
        let dispatcher = Dispatcher::new(Recording::default(), 50, plan(-1));
        assert_eq!(dispatcher.worker_count().unwrap(), 50);

        let results = dispatcher.run().await.unwrap();
        assert_eq!(results.stats().units, 50);
        assert_eq!(results.len(), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn capped_run_uses_even_sub_ranges() {
        let dispatcher = Dispatcher::new(Recording::default(), 50, plan(5));
        assert_eq!(dispatcher.worker_count().unwrap(), 5);

        let results = dispatcher.run().await.unwrap();
        assert_eq!(results.stats().units, 5);

        // Each unit contributes a contiguous, ascending block of 10.
        for block in results.jobs().chunks(10) {
            let first: usize = block[0].trim_start_matches("uuid-").parse().unwrap();
            assert_eq!(first % 10, 0);
            for (offset, id) in block.iter().enumerate() {
                assert_eq!(id, &format!("uuid-{}", first + offset));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn single_failure_only_drops_its_index() {
        let fetcher = Recording {
            fail: HashSet::from([5]),
            ..Recording::default()
        };
        let results = Dispatcher::new(fetcher, 10, plan(3)).run().await.unwrap();

        assert_eq!(results.len(), 9);
        assert!(!results.jobs().contains(&"uuid-5".to_string()));
        assert_eq!(results.stats().failures, 1);
        assert_eq!(results.stats().units_with_failures, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn misses_are_dropped_without_failures() {
        let fetcher = Recording {
            miss: HashSet::from([0, 9]),
            ..Recording::default()
        };
        let results = Dispatcher::new(fetcher, 10, plan(2)).run().await.unwrap();

        assert_eq!(results.len(), 8);
        assert_eq!(results.stats().misses, 2);
        assert_eq!(results.stats().failures, 0);
        assert_eq!(results.stats().units_with_failures, 0);
    }

    #[tokio::test]
    async fn zero_requests_is_invalid_partition() {
        let dispatcher = Dispatcher::new(Recording::default(), 0, plan(4));
        assert!(matches!(
            dispatcher.run().await,
            Err(Error::InvalidPartition { .. })
        ));
        assert!(dispatcher.fetcher.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pre_cancelled_run_returns_empty_set() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let results = Dispatcher::new(Recording::default(), 20, plan(4))
            .with_cancellation(cancel)
            .run()
            .await
            .unwrap();

        assert!(results.is_empty());
        assert_eq!(results.stats().cancelled, 20);
        assert_eq!(results.stats().units, 4);
    }
}
