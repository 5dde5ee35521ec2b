//! Value types shared by the zhonghong crates

pub mod address;
pub mod error;
pub mod modes;

pub use address::Address;
pub use error::{Error, Result};
pub use modes::{Attribute, FanMode, Operation, Switch};
