use crate::executor::{RawResponse, Transport};
use stampede_core::{RequestSpec, TransportKind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Respond = dyn Fn(&RequestSpec) -> Result<u16, TransportKind> + Send + Sync;

/// In-process transport for unit tests: no network, scripted responses.
#[derive(Clone)]
pub(crate) struct ScriptedTransport {
    delay: Duration,
    respond: Arc<Respond>,
    hits: Arc<AtomicU64>,
}

impl ScriptedTransport {
    pub fn ok(code: u16) -> Self {
        Self::with(move |_| Ok(code))
    }

    pub fn failing(kind: TransportKind) -> Self {
        Self::with(move |_| Err(kind))
    }

    pub fn with(respond: impl Fn(&RequestSpec) -> Result<u16, TransportKind> + Send + Sync + 'static) -> Self {
        Self {
            delay: Duration::ZERO,
            respond: Arc::new(respond),
            hits: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Transport for ScriptedTransport {
    async fn send(
        &self,
        spec: &RequestSpec,
        _timeout: Duration,
    ) -> Result<RawResponse, TransportKind> {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.respond)(spec).map(|code| RawResponse { code })
    }
}
