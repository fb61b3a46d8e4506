use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = "0.0.0.0:3002".parse()?;
    tracing::info!("mock service listening on {addr}");
    mock_service::run(addr).await;
    Ok(())
}
