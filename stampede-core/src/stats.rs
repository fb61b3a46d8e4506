use serde::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Aggregate results of a completed run, computed once from the full set of
/// outcomes after every VU has reported.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    pub virtual_users: u32,
    /// Full scenario passes completed across all VUs.
    pub total_iterations: u64,
    /// Request attempts, including errored and cancelled ones.
    pub total_requests: u64,
    pub success_count: u64,
    /// Failed attempts keyed by kind (`http_503`, `transport_connect`, ...).
    pub error_counts: BTreeMap<String, u64>,
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub latency_p50: Duration,
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub latency_p90: Duration,
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub latency_p99: Duration,
    pub mean_tps: f64,
    /// Wall-clock time from launch to the end of the drain.
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub achieved_duration: Duration,
}

impl RunSummary {
    pub fn error_count(&self) -> u64 {
        self.error_counts.values().sum()
    }

    /// Failed fraction of all attempts, in `[0, 1]`. Zero for an empty run.
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.error_count() as f64 / self.total_requests as f64
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run summary")?;
        writeln!(f, "  virtual users    {}", self.virtual_users)?;
        writeln!(
            f,
            "  duration         {}",
            humantime::format_duration(self.achieved_duration)
        )?;
        writeln!(f, "  iterations       {}", self.total_iterations)?;
        writeln!(
            f,
            "  requests         {} ({:.1}/s)",
            self.total_requests, self.mean_tps
        )?;
        writeln!(f, "  success          {}", self.success_count)?;
        writeln!(
            f,
            "  errors           {} ({:.2}%)",
            self.error_count(),
            self.error_rate() * 100.0
        )?;
        for (kind, count) in &self.error_counts {
            writeln!(f, "    {kind:<18} {count}")?;
        }
        writeln!(
            f,
            "  latency p50      {}",
            humantime::format_duration(self.latency_p50)
        )?;
        writeln!(
            f,
            "  latency p90      {}",
            humantime::format_duration(self.latency_p90)
        )?;
        write!(
            f,
            "  latency p99      {}",
            humantime::format_duration(self.latency_p99)
        )
    }
}
