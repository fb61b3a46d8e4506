use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;

/// The recorded result of one request attempt by one VU. Created once per
/// attempt and never mutated; owned by the aggregator after drain.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Outcome {
    pub vu_id: u32,
    /// Zero-based iteration index within the reporting VU.
    pub iteration: u64,
    /// Offset of the attempt from the shared run start.
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub start_offset: Duration,
    #[serde_as(as = "DurationSecondsWithFrac")]
    pub latency: Duration,
    pub status: OutcomeStatus,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success { .. })
    }

    /// Key under which this outcome lands in the summary's error breakdown,
    /// or `None` for successes.
    pub fn error_key(&self) -> Option<String> {
        match self.status {
            OutcomeStatus::Success { .. } => None,
            OutcomeStatus::HttpError { code } => Some(format!("http_{code}")),
            OutcomeStatus::Transport(kind) => Some(format!("transport_{kind}")),
            OutcomeStatus::Cancelled => Some("cancelled".to_string()),
        }
    }
}

/// Classification of a single request attempt.
///
/// A received response is a completed attempt whatever its status code;
/// `HttpError` feeds the summary's error breakdown but is never an
/// execution failure and never stops the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeStatus {
    /// Response received with a status code below 400.
    Success { code: u16 },
    /// Response received with a 4xx or 5xx status code.
    HttpError { code: u16 },
    /// No response: network-level failure or per-request timeout.
    Transport(TransportKind),
    /// The VU was force-abandoned at the drain timeout.
    Cancelled,
}

/// Network-level failure classification. Timeouts are a transport subtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Connection could not be established (refused, reset, DNS failure).
    Connect,
    /// No response within the per-request timeout.
    Timeout,
    Other,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransportKind::Connect => "connect",
            TransportKind::Timeout => "timeout",
            TransportKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Lifecycle of a run as a whole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Pending => "pending",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
