use stampede_core::{Method, OutcomeStatus, RequestSpec, TransportKind};
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

/// The response surface the engine needs from an HTTP client: just the
/// status code. Bodies are drained and discarded by the transport.
#[derive(Clone, Copy, Debug)]
pub struct RawResponse {
    pub code: u16,
}

/// The HTTP capability consumed by the engine: send one request, get a
/// response or a classified transport failure. The engine never depends on
/// a concrete client beyond this seam.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    async fn send(
        &self,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<RawResponse, TransportKind>;
}

/// Default transport backed by `reqwest` with rustls.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for HttpTransport {
    async fn send(
        &self,
        spec: &RequestSpec,
        timeout: Duration,
    ) -> Result<RawResponse, TransportKind> {
        let method = match spec.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Patch => reqwest::Method::PATCH,
            Method::Options => reqwest::Method::OPTIONS,
        };

        let mut request = self.client.request(method, &spec.url).timeout(timeout);
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &spec.body {
            request = request.body(body.clone());
        }

        match request.send().await {
            Ok(response) => Ok(RawResponse {
                code: response.status().as_u16(),
            }),
            Err(err) => {
                trace!("transport failure: {err}");
                Err(classify(&err))
            }
        }
    }
}

fn classify(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    }
}

/// Issues a single logical request and classifies the result.
///
/// One attempt per call, no retries: retry policy belongs to whoever calls
/// this, and this harness has none.
pub struct Executor<T> {
    transport: T,
    timeout: Duration,
}

impl<T> Executor<T>
where
    T: Transport + Sync,
{
    pub fn new(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Performs one network call and returns its classification and
    /// latency. A received response of any status code in `[100, 599)` is a
    /// completed attempt; 4xx/5xx codes are recorded for the summary's
    /// error breakdown, not treated as execution failures.
    pub async fn execute(&self, spec: &RequestSpec) -> (OutcomeStatus, Duration) {
        let start = Instant::now();
        let result = self.transport.send(spec, self.timeout).await;
        let latency = start.elapsed();

        let status = match result {
            Ok(response) if response.code < 400 => OutcomeStatus::Success {
                code: response.code,
            },
            Ok(response) => OutcomeStatus::HttpError {
                code: response.code,
            },
            Err(kind) => OutcomeStatus::Transport(kind),
        };

        #[cfg(feature = "metrics")]
        record_metrics(&status, latency);

        (status, latency)
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(status: &OutcomeStatus, latency: Duration) {
    metrics::histogram!("stampede.request.latency").record(latency.as_nanos() as f64);
    match status {
        OutcomeStatus::Success { .. } => {
            metrics::counter!("stampede.request.success").increment(1);
        }
        _ => {
            metrics::counter!("stampede.request.error").increment(1);
        }
    }
}
