//! Worker-count planning.
//!
//! The effective number of workers for a run is derived from an explicit
//! `(load_factor, worker_cap)` pair rather than from hard-coded heuristics:
//!
//! ```text
//! workers = min(ceil(num_requests * load_factor), num_requests, cap)
//! ```

use crate::{Error, Result};
use core::num::NonZeroUsize;

/// Upper bound on the number of concurrent workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerCap {
    /// No clamping is applied.
    #[default]
    Unlimited,
    /// At most this many workers are spawned.
    Limited(NonZeroUsize),
}

impl WorkerCap {
    /// Interprets a raw `max_threads` setting. Zero and negative values mean
    /// "no limit".
    pub fn from_max_threads(max_threads: i64) -> Self {
        usize::try_from(max_threads)
            .ok()
            .and_then(NonZeroUsize::new)
            .map_or(Self::Unlimited, Self::Limited)
    }

    fn clamp(self, workers: usize) -> usize {
        match self {
            Self::Unlimited => workers,
            Self::Limited(cap) => workers.min(cap.get()),
        }
    }
}

/// Ratio of workers to requests. `1.0` means one worker per request (before
/// the cap is applied).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadFactor(f64);

impl LoadFactor {
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartition`] unless `value` is finite and
    /// strictly positive.
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(Error::invalid_partition(format!(
                "load factor must be a finite positive number, got {value}"
            )))
        }
    }

    pub const fn get(self) -> f64 {
        self.0
    }
}

impl Default for LoadFactor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// The worker-count inputs for a single run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkerPlan {
    pub load_factor: LoadFactor,
    pub cap: WorkerCap,
}

impl WorkerPlan {
    pub const fn new(load_factor: LoadFactor, cap: WorkerCap) -> Self {
        Self { load_factor, cap }
    }

    /// Computes the effective worker count for `num_requests` jobs.
    ///
    /// The result is never zero and never exceeds `num_requests` or the
    /// configured cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPartition`] if the plan yields zero workers,
    /// which happens when `num_requests` is zero.
    pub fn effective_workers(&self, num_requests: usize) -> Result<usize> {
        // Float-to-int `as` casts saturate, so huge products clamp to
        // usize::MAX and are then bounded by `num_requests`.
        let target = (num_requests as f64 * self.load_factor.get()).ceil() as usize;
        let workers = self.cap.clamp(target.min(num_requests));

        if workers == 0 {
            return Err(Error::invalid_partition(format!(
                "{num_requests} requests yield no workers"
            )));
        }

        Ok(workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(n: usize) -> WorkerCap {
        WorkerCap::Limited(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn negative_max_threads_is_unlimited() {
        assert_eq!(WorkerCap::from_max_threads(-1), WorkerCap::Unlimited);
        assert_eq!(WorkerCap::from_max_threads(0), WorkerCap::Unlimited);
        assert_eq!(WorkerCap::from_max_threads(5), cap(5));
    }

    #[test]
    fn unlimited_uses_one_worker_per_request() {
        let plan = WorkerPlan::new(LoadFactor::default(), WorkerCap::from_max_threads(-1));
        assert_eq!(plan.effective_workers(50).unwrap(), 50);
    }

    #[test]
    fn cap_clamps_worker_count() {
        let plan = WorkerPlan::new(LoadFactor::default(), WorkerCap::from_max_threads(5));
        assert_eq!(plan.effective_workers(50).unwrap(), 5);
    }

    #[test]
    fn load_factor_rounds_up() {
        let plan = WorkerPlan::new(LoadFactor::new(0.8).unwrap(), WorkerCap::Unlimited);
        assert_eq!(plan.effective_workers(10).unwrap(), 8);
        assert_eq!(plan.effective_workers(1).unwrap(), 1);
        assert_eq!(plan.effective_workers(3).unwrap(), 3);
    }

    #[test]
    fn never_exceeds_request_count() {
        let plan = WorkerPlan::new(LoadFactor::new(4.0).unwrap(), cap(100));
        assert_eq!(plan.effective_workers(7).unwrap(), 7);
    }

    #[test]
    fn zero_requests_is_invalid() {
        let plan = WorkerPlan::default();
        assert!(matches!(
            plan.effective_workers(0),
            Err(Error::InvalidPartition { .. })
        ));
    }

    #[test]
    fn rejects_bad_load_factor() {
        assert!(LoadFactor::new(0.0).is_err());
        assert!(LoadFactor::new(-1.0).is_err());
        assert!(LoadFactor::new(f64::NAN).is_err());
        assert!(LoadFactor::new(f64::INFINITY).is_err());
    }
}
