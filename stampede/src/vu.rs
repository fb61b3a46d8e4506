use crate::clock::Deadline;
use crate::executor::{Executor, Transport};
use governor::DefaultDirectRateLimiter;
use stampede_core::{Outcome, RunConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Why a virtual user reached Done.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VuTermination {
    /// Stopped cleanly: deadline, iteration cap, or stop signal.
    Completed,
    /// Missed the drain window and was force-abandoned by the pool.
    Abandoned,
}

/// One virtual user's terminal report: its buffered outcomes and how it
/// stopped. Buffers are merged into the aggregator at the drain barrier.
#[derive(Debug)]
pub struct VuReport {
    pub vu_id: u32,
    /// Full scenario passes completed by this VU.
    pub iterations: u64,
    pub outcomes: Vec<Outcome>,
    pub termination: VuTermination,
}

/// Everything a VU task needs, cloned once per task at launch. All VUs get
/// the same `Deadline` value and the same cancellation token.
pub(crate) struct VuContext<T> {
    pub config: Arc<RunConfig>,
    pub executor: Arc<Executor<T>>,
    pub deadline: Deadline,
    pub cancel: CancellationToken,
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl<T> Clone for VuContext<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            executor: self.executor.clone(),
            deadline: self.deadline,
            cancel: self.cancel.clone(),
            limiter: self.limiter.clone(),
        }
    }
}

/// Gauge of live virtual users with a waitable zero state, so the runner
/// can notice iteration-capped runs finishing before the deadline.
pub(crate) struct VuGauge {
    active: AtomicUsize,
    notify: Notify,
}

impl VuGauge {
    pub fn new() -> Self {
        Self {
            active: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    pub fn incr(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    pub fn decr(&self) {
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Resolves once the gauge reaches zero.
    pub async fn idle(&self) {
        loop {
            let notified = self.notify.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Main virtual user loop: `Idle -> Running -> Stopping -> Done`.
///
/// Runs scenario iterations back to back until the shared deadline expires,
/// the stop signal fires, or the per-VU iteration cap is hit. A deadline or
/// stop signal observed mid-iteration lets the in-flight request finish,
/// then stops without starting the next step, so no outcome is ever
/// half-recorded. Per-request errors never escape this loop; they become
/// outcomes and the loop continues.
pub(crate) async fn vu_loop<T>(vu_id: u32, ctx: VuContext<T>) -> VuReport
where
    T: Transport + Send + Sync + 'static,
{
    trace!(vu_id, "running");
    let mut outcomes = Vec::new();
    let mut iterations: u64 = 0;

    'run: loop {
        if ctx.cancel.is_cancelled() || ctx.deadline.expired() {
            break;
        }
        if let Some(max) = ctx.config.max_iterations {
            if iterations >= max {
                trace!(vu_id, iterations, "iteration cap reached");
                break;
            }
        }

        if let Some(limiter) = &ctx.limiter {
            tokio::select! {
                _ = limiter.until_ready() => {}
                _ = ctx.cancel.cancelled() => break,
            }
        }

        let steps = ctx.config.scenario.len();
        for (idx, spec) in ctx.config.scenario.iter().enumerate() {
            let start_offset = ctx.deadline.elapsed();
            let (status, latency) = ctx.executor.execute(spec).await;
            outcomes.push(Outcome {
                vu_id,
                iteration: iterations,
                start_offset,
                latency,
                status,
            });

            // Stopping: the in-flight request above was allowed to finish;
            // an unfinished pass does not count as an iteration.
            if idx + 1 < steps && (ctx.deadline.expired() || ctx.cancel.is_cancelled()) {
                trace!(vu_id, "stopping mid-iteration");
                break 'run;
            }
        }
        iterations += 1;

        if let Some(delay) = ctx.config.iteration_delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = ctx.cancel.cancelled() => break,
            }
        }
    }

    debug!(vu_id, iterations, "virtual user done");
    VuReport {
        vu_id,
        iterations,
        outcomes,
        termination: VuTermination::Completed,
    }
}
