//! # zhonghong-core
//!
//! Core protocol implementation for Zhonghong HVAC gateways.
//!
//! This crate provides the low-level protocol primitives:
//! - Header, payload records and message encoding/decoding
//! - Checksum calculation
//! - Function and control code definitions
//! - Frame synchronization over a byte stream
//! - Session state

pub mod checksum;
pub mod codes;
pub mod constants;
pub mod error;
pub mod header;
pub mod message;
pub mod record;
pub mod scanner;
pub mod session;

pub use codes::{CtlCode, FuncCode, StatusKind};
pub use error::{Error, Result};
pub use header::Header;
pub use message::{Direction, Message};
pub use record::{OnlineRecord, Record, StatusRecord};
pub use scanner::{FrameBuffer, Frames};
pub use session::{Session, SessionState};

/// Default gateway port
pub const DEFAULT_PORT: u16 = 9999;
