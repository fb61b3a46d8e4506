use crate::aggregator::Aggregator;
use crate::clock::Deadline;
use crate::executor::{Executor, Transport};
use crate::vu::{vu_loop, VuContext, VuGauge, VuReport};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use stampede_core::RunConfig;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// Launches and supervises the configured number of concurrent VU loops.
pub struct VuPool;

impl VuPool {
    /// Spawns `virtual_users` VU tasks. The shared deadline is constructed
    /// here, at the moment of launch, and handed to every VU by value, so
    /// the whole pool races against one wall-clock boundary rather than
    /// per-VU recomputed ones.
    pub fn start<T>(config: Arc<RunConfig>, transport: T) -> RunHandle
    where
        T: Transport + Send + Sync + 'static,
    {
        let deadline = Deadline::after(config.duration);
        let cancel = CancellationToken::new();
        let gauge = Arc::new(VuGauge::new());
        let executor = Arc::new(Executor::new(transport, config.request_timeout));
        let limiter = config.max_tps.map(|tps| Arc::new(rate_limiter(tps)));

        let mut tasks = Vec::with_capacity(config.virtual_users as usize);
        for vu_id in 0..config.virtual_users {
            let ctx = VuContext {
                config: config.clone(),
                executor: executor.clone(),
                deadline,
                cancel: cancel.clone(),
                limiter: limiter.clone(),
            };
            gauge.incr();
            let gauge = gauge.clone();
            let handle = tokio::spawn(async move {
                let report = vu_loop(vu_id, ctx).await;
                gauge.decr();
                report
            });
            tasks.push((vu_id, handle));
        }
        debug!(vus = config.virtual_users, "virtual users launched");

        RunHandle {
            deadline,
            cancel,
            gauge,
            tasks,
            drain_timeout: config.drain_timeout,
        }
    }
}

/// Handle to a launched pool: the shared deadline, the stop signal, and the
/// join handles needed for the graceful drain.
pub struct RunHandle {
    deadline: Deadline,
    cancel: CancellationToken,
    gauge: Arc<VuGauge>,
    tasks: Vec<(u32, JoinHandle<VuReport>)>,
    drain_timeout: Duration,
}

impl RunHandle {
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    pub fn launched(&self) -> u32 {
        self.tasks.len() as u32
    }

    /// Resolves once every VU has reached Done on its own, e.g. when an
    /// iteration cap empties the pool before the deadline.
    pub async fn all_done(&self) {
        self.gauge.idle().await;
    }

    /// Graceful drain: signals every VU to stop, then joins each one within
    /// the shared drain window. VUs that miss the window are aborted and
    /// reported to the aggregator as abandoned; a VU whose task failed is
    /// logged and reported the same way, without affecting its peers.
    pub async fn drain(mut self, aggregator: &mut Aggregator) {
        self.cancel.cancel();

        let drain_deadline = Instant::now() + self.drain_timeout;
        for (vu_id, mut handle) in self.tasks.drain(..) {
            let remaining = drain_deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(Ok(report)) => aggregator.merge(report),
                Ok(Err(err)) => {
                    error!(vu_id, "virtual user task failed: {err}");
                    aggregator.record_abandoned(vu_id, self.deadline.elapsed());
                }
                Err(_) => {
                    warn!(vu_id, "virtual user missed the drain window, aborting");
                    handle.abort();
                    aggregator.record_abandoned(vu_id, self.deadline.elapsed());
                }
            }
        }
        debug!("drain complete");
    }
}

fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps).allow_burst(NonZeroU32::MIN))
}
