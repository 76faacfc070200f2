use super::unit::{UnitReport, UnitStatus};
use core::ops::Range;

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Job indices in the run, `N`.
    pub requested: usize,
    /// Identifiers harvested.
    pub harvested: usize,
    /// Well-formed responses without an identifier.
    pub misses: usize,
    /// Indices that failed (timeout, connection, status, decode) or were
    /// lost with their unit.
    pub failures: usize,
    /// Indices skipped because the run was cancelled.
    pub cancelled: usize,
    /// Units that reported back.
    pub units: usize,
    /// Units that reported at least one failure or cancellation.
    pub units_with_failures: usize,
}

/// Identifiers harvested across all units.
///
/// Units are appended in completion order; within a unit, identifiers keep
/// ascending job-index order. The set is owned by the dispatcher's single
/// aggregation loop, so appends never race.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    jobs: Vec<String>,
    stats: RunStats,
}

impl ResultSet {
    pub(crate) fn with_capacity(requested: usize) -> Self {
        Self {
            jobs: Vec::with_capacity(requested),
            stats: RunStats {
                requested,
                ..RunStats::default()
            },
        }
    }

    /// Appends a completed unit's identifiers and folds its counters in.
    pub(crate) fn absorb(&mut self, report: UnitReport) {
        self.stats.units += 1;
        if report.status() == UnitStatus::CompletedWithPartialFailures {
            self.stats.units_with_failures += 1;
        }
        self.stats.harvested += report.jobs.len();
        self.stats.misses += report.misses.len();
        self.stats.failures += report.failures.len();
        self.stats.cancelled += report.cancelled;
        self.jobs.extend(report.jobs);
    }

    /// Accounts for a unit that never reported back: all of its indices are
    /// failures.
    pub(crate) fn record_lost_unit(&mut self, range: &Range<usize>) {
        self.stats.failures += range.len();
        self.stats.units_with_failures += 1;
    }

    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }

    pub fn into_jobs(self) -> Vec<String> {
        self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// True when every requested index produced an identifier.
    pub fn is_complete(&self) -> bool {
        self.jobs.len() == self.stats.requested
    }
}
