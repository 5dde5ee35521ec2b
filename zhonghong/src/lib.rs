//! # zhonghong
//!
//! Async client for Zhonghong HVAC gateways.
//!
//! ## Features
//!
//! - Typed frames with checksum validation
//! - Frame resynchronization over a lossy byte stream
//! - Unit discovery, status queries and control commands
//! - Background listener with per-unit callbacks
//! - Automatic socket reopening on connection loss
//!
//! ## Quick Start
//!
//! ```no_run
//! use zhonghong::{GatewayConfig, GatewaySession, Operation};
//!
//! #[tokio::main]
//! async fn main() -> zhonghong::Result<()> {
//!     let gateway = GatewaySession::new(GatewayConfig::new("192.168.1.50", 9999, 1));
//!
//!     // Find the indoor units
//!     let units = gateway.discover().await?;
//!
//!     for &unit in &units {
//!         gateway.register_callback(unit, |status| println!("{}", status));
//!     }
//!
//!     gateway.start_listening().await?;
//!     gateway.query_all_status().await;
//!
//!     if let Some(&unit) = units.first() {
//!         gateway.set_operation(unit, Operation::Cool).await;
//!     }
//!
//!     gateway.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod registry;

// Re-exports
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use gateway::GatewaySession;
pub use registry::{DeviceHandle, EchoCallback, StatusCallback};

// Re-export protocol types
pub use zhonghong_core::{Message, SessionState, StatusRecord};
pub use zhonghong_transport::Keepalive;
pub use zhonghong_types::{Address, Attribute, FanMode, Operation, Switch};
