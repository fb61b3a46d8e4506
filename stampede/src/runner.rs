use crate::aggregator::Aggregator;
use crate::executor::{HttpTransport, Transport};
use crate::pool::VuPool;
use stampede_core::{RunConfig, RunError, RunState, RunSummary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Final product of a run: how it ended and what it measured.
#[derive(Clone, Debug)]
pub struct RunReport {
    pub state: RunState,
    pub summary: RunSummary,
}

impl RunReport {
    /// Process exit code for this run. Request failures are load-test data,
    /// not process failures: only a run in which no iteration ever
    /// completed maps to a non-zero exit. Config and aggregation errors
    /// surface earlier, as `RunError`.
    pub fn exit_code(&self) -> i32 {
        if self.summary.total_iterations == 0 {
            1
        } else {
            0
        }
    }
}

/// Top-level orchestrator: validate config, start the pool, wait for the
/// deadline (or an abort, or early completion), drain, summarize.
pub struct Runner<T = HttpTransport> {
    config: Arc<RunConfig>,
    transport: T,
    abort: CancellationToken,
}

impl Runner<HttpTransport> {
    pub fn new(config: RunConfig) -> Self {
        Self::with_transport(config, HttpTransport::new())
    }
}

impl<T> Runner<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Runs against a caller-provided HTTP capability instead of the
    /// default reqwest-backed one.
    pub fn with_transport(config: RunConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            abort: CancellationToken::new(),
        }
    }

    /// Cancelling this token aborts the run early: in-flight requests
    /// finish (bounded by the request timeout) and the pool drains.
    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    #[instrument(name = "run", skip_all, fields(vus = self.config.virtual_users))]
    pub async fn run(self) -> Result<RunReport, RunError> {
        let mut state = RunState::Pending;
        self.config.validate()?;
        trace!(%state, "config validated");

        info!(
            duration = ?self.config.duration,
            scenario_steps = self.config.scenario.len(),
            "starting load run"
        );
        let handle = VuPool::start(self.config.clone(), self.transport);
        let deadline = handle.deadline();
        state = RunState::Running;

        tokio::select! {
            _ = tokio::time::sleep(deadline.remaining()) => {
                debug!("deadline reached");
            }
            _ = self.abort.cancelled() => {
                warn!("abort signal received, draining virtual users");
                state = RunState::Aborted;
            }
            _ = handle.all_done() => {
                debug!("all virtual users finished before the deadline");
            }
        }

        let mut aggregator = Aggregator::new(handle.launched());
        handle.drain(&mut aggregator).await;

        let summary = aggregator.summarize(deadline.elapsed())?;
        if state == RunState::Running {
            state = RunState::Completed;
        }
        info!(
            iterations = summary.total_iterations,
            success = summary.success_count,
            errors = summary.error_count(),
            "run {state}"
        );
        Ok(RunReport { state, summary })
    }
}
