//! Status listener example
//!
//! Discovers the units, prints every status report for a while and turns the
//! first unit on.

use std::time::Duration;
use tokio::time::sleep;
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
    for &unit in &units {
        gateway.register_callback(unit, |status| println!("{}", status));
        gateway.register_echo_callback(unit, |unit, attribute| {
            println!("{} confirmed {}", unit, attribute)
        });
    }

    gateway.start_listening().await?;
    gateway.query_all_status().await;

    if let Some(&unit) = units.first() {
        println!("Turning {} on...", unit);
        gateway.turn_on(unit).await;
    }

    sleep(Duration::from_secs(30)).await;

    gateway.close().await;
    Ok(())
}
