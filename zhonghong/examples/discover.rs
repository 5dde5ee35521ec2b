//! Unit discovery example

use tracing_subscriber::EnvFilter;
use zhonghong::{GatewayConfig, GatewaySession};

#[tokio::main]
async fn main() -> zhonghong::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let host = std::env::var("GATEWAY_HOST").unwrap_or_else(|_| "192.168.1.50".to_string());
    let port = std::env::var("GATEWAY_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(9999);
    let gateway_address = std::env::var("GATEWAY_ADDR")
        .ok()
        .and_then(|a| a.parse().ok())
        .unwrap_or(1);

    let gateway = GatewaySession::new(GatewayConfig::new(host, port, gateway_address));

    let units = gateway.discover().await?;
    println!("Found {} units", units.len());
    for unit in &units {
        println!("  {}", unit);
    }

    gateway.close().await;
    Ok(())
}
