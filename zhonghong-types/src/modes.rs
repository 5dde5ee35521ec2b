//! Unit operating modes and controllable attributes

use std::fmt;

use crate::error::{Error, Result};

/// Power switch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Switch {
    Off = 0x00,
    On = 0x01,
}

impl Switch {
    /// Interpret a raw status byte; only the lowest bit carries the state.
    pub fn from_raw(value: u8) -> Self {
        if value % 2 == 1 { Self::On } else { Self::Off }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
        }
    }
}

impl TryFrom<u8> for Switch {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Off),
            0x01 => Ok(Self::On),
            _ => Err(Error::InvalidValue { field: "switch", value }),
        }
    }
}

/// Operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operation {
    Cool = 0x01,
    Dry = 0x02,
    FanOnly = 0x04,
    Heat = 0x08,
}

impl Operation {
    pub const ALL: [Self; 4] = [Self::Cool, Self::Dry, Self::FanOnly, Self::Heat];

    pub fn name(self) -> &'static str {
        match self {
            Self::Cool => "COOL",
            Self::Dry => "DRY",
            Self::FanOnly => "FAN_ONLY",
            Self::Heat => "HEAT",
        }
    }
}

impl TryFrom<u8> for Operation {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::Cool),
            0x02 => Ok(Self::Dry),
            0x04 => Ok(Self::FanOnly),
            0x08 => Ok(Self::Heat),
            _ => Err(Error::InvalidValue { field: "operation", value }),
        }
    }
}

/// Fan speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FanMode {
    High = 0x01,
    Mid = 0x02,
    MidHigh = 0x03,
    Low = 0x04,
    MidLow = 0x05,
}

impl FanMode {
    pub const ALL: [Self; 5] = [Self::High, Self::Mid, Self::Low, Self::MidHigh, Self::MidLow];

    pub fn name(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Mid => "MID",
            Self::MidHigh => "MIDHIGH",
            Self::Low => "LOW",
            Self::MidLow => "MIDLOW",
        }
    }
}

impl TryFrom<u8> for FanMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::High),
            0x02 => Ok(Self::Mid),
            0x03 => Ok(Self::MidHigh),
            0x04 => Ok(Self::Low),
            0x05 => Ok(Self::MidLow),
            _ => Err(Error::InvalidValue { field: "fan mode", value }),
        }
    }
}

macro_rules! impl_display_and_raw {
    ($($ty:ty),*) => {$(
        impl From<$ty> for u8 {
            fn from(value: $ty) -> u8 {
                value as u8
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    )*};
}

impl_display_and_raw!(Switch, Operation, FanMode);

/// A single controllable attribute of a unit, together with its value
///
/// Every control command carries exactly one of these, and the gateway echoes
/// it back once the unit accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Power(Switch),
    TargetTemperature(u8),
    Operation(Operation),
    FanMode(FanMode),
}

impl Attribute {
    /// Raw value byte as carried in the control code position
    pub fn value(self) -> u8 {
        match self {
            Self::Power(switch) => switch.into(),
            Self::TargetTemperature(temp) => temp,
            Self::Operation(op) => op.into(),
            Self::FanMode(fan) => fan.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power(switch) => write!(f, "power {}", switch),
            Self::TargetTemperature(temp) => write!(f, "target temperature {}", temp),
            Self::Operation(op) => write!(f, "operation {}", op),
            Self::FanMode(fan) => write!(f, "fan mode {}", fan),
        }
    }
}
