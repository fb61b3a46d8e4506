//! Small axum target service for exercising the harness in tests: fixed
//! responses, artificial delays, arbitrary status codes and a flaky route.
//! Each router instance keeps its own hit counter, exposed at `/hits`.

use axum::{debug_handler, extract::Path, extract::State, http::StatusCode, routing::get, Router};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Default)]
struct ServiceState {
    hits: Arc<AtomicU64>,
}

pub fn router() -> Router {
    Router::new()
        .route("/ok", get(ok))
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/status/:code", get(status))
        .route("/flaky/:percent", get(flaky))
        .route("/hits", get(hits))
        .with_state(ServiceState::default())
}

pub async fn run(addr: SocketAddr) {
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, router()).await.unwrap();
}

/// Binds an ephemeral local port, serves in the background, and returns the
/// bound address.
pub async fn spawn() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router()).await.unwrap();
    });
    addr
}

async fn ok(State(state): State<ServiceState>) -> &'static str {
    state.hits.fetch_add(1, Ordering::Relaxed);
    "ok"
}

#[debug_handler]
async fn delay(State(state): State<ServiceState>, Path(delay_ms): Path<u64>) {
    state.hits.fetch_add(1, Ordering::Relaxed);
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
async fn status(State(state): State<ServiceState>, Path(code): Path<u16>) -> StatusCode {
    state.hits.fetch_add(1, Ordering::Relaxed);
    debug!("returning status {code}");
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[debug_handler]
async fn flaky(State(state): State<ServiceState>, Path(percent): Path<u8>) -> StatusCode {
    state.hits.fetch_add(1, Ordering::Relaxed);
    if rand::thread_rng().gen_range(0..100) < percent {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn hits(State(state): State<ServiceState>) -> String {
    state.hits.load(Ordering::Relaxed).to_string()
}
