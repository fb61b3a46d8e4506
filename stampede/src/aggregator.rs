use crate::vu::{VuReport, VuTermination};
use pdatastructs::tdigest::{TDigest, K1};
use stampede_core::{AggregationError, Outcome, OutcomeStatus, RunSummary};
use std::collections::BTreeMap;
use std::time::Duration;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Collects every VU's outcome buffer and derives the final summary.
///
/// Buffers arrive at the drain barrier, one per VU, so no locking is needed
/// here; the pool's drain is what guarantees `summarize` happens-after all
/// reporting.
pub struct Aggregator {
    launched: u32,
    reported: u32,
    total_iterations: u64,
    outcomes: Vec<Outcome>,
}

impl Aggregator {
    pub fn new(launched: u32) -> Self {
        Self {
            launched,
            reported: 0,
            total_iterations: 0,
            outcomes: Vec::new(),
        }
    }

    /// Folds in one VU's terminal report.
    pub fn merge(&mut self, report: VuReport) {
        debug_assert_eq!(report.termination, VuTermination::Completed);
        self.reported += 1;
        self.total_iterations += report.iterations;
        self.outcomes.extend(report.outcomes);
    }

    /// Records a VU that was force-abandoned at the drain timeout. It still
    /// counts as reported (the terminal-condition invariant) and leaves one
    /// `Cancelled` outcome so the summary flags it.
    pub fn record_abandoned(&mut self, vu_id: u32, at: Duration) {
        self.reported += 1;
        self.outcomes.push(Outcome {
            vu_id,
            iteration: 0,
            start_offset: at,
            latency: Duration::ZERO,
            status: OutcomeStatus::Cancelled,
        });
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Computes the run summary over the full outcome set. Fails if any
    /// launched VU has not yet reported a terminal condition; calling it
    /// again on the same drained set yields identical values.
    pub fn summarize(&self, achieved_duration: Duration) -> Result<RunSummary, AggregationError> {
        if self.reported < self.launched {
            return Err(AggregationError::Incomplete {
                launched: self.launched,
                reported: self.reported,
            });
        }

        let mut success_count = 0u64;
        let mut error_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut digest = TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE);
        let mut measured = 0u64;

        for outcome in &self.outcomes {
            match outcome.error_key() {
                None => success_count += 1,
                Some(key) => *error_counts.entry(key).or_insert(0) += 1,
            }
            // Cancelled outcomes carry no measured latency.
            if outcome.status != OutcomeStatus::Cancelled {
                digest.insert(outcome.latency.as_secs_f64());
                measured += 1;
            }
        }

        let total_requests = self.outcomes.len() as u64;
        let mean_tps = if achieved_duration.is_zero() {
            0.0
        } else {
            total_requests as f64 / achieved_duration.as_secs_f64()
        };

        Ok(RunSummary {
            virtual_users: self.launched,
            total_iterations: self.total_iterations,
            total_requests,
            success_count,
            error_counts,
            latency_p50: quantile(&digest, 0.50, measured),
            latency_p90: quantile(&digest, 0.90, measured),
            latency_p99: quantile(&digest, 0.99, measured),
            mean_tps,
            achieved_duration,
        })
    }
}

fn quantile(digest: &TDigest<K1>, q: f64, samples: u64) -> Duration {
    if samples == 0 {
        return Duration::ZERO;
    }
    let secs = digest.quantile(q);
    if secs.is_finite() {
        Duration::from_secs_f64(secs.max(0.0))
    } else {
        // The t-digest can yield NaN on degenerate inputs.
        warn!("non-finite latency quantile, reporting zero");
        Duration::ZERO
    }
}
