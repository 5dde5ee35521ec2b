//! Function and control code definitions

use std::fmt;

use zhonghong_types::{Attribute, FanMode, Operation, Switch};

use crate::error::{Error, Result};

/// Function codes (message type)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FuncCode {
    Status = 0x50,
    CtlPower = 0x31,
    CtlTemperature = 0x32,
    CtlOperation = 0x33,
    CtlFanMode = 0x34,
}

impl FuncCode {
    /// Check if this is one of the control commands
    pub fn is_control(self) -> bool {
        !matches!(self, Self::Status)
    }

    /// Get function code name
    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "STATUS",
            Self::CtlPower => "CTL_POWER",
            Self::CtlTemperature => "CTL_TEMPERATURE",
            Self::CtlOperation => "CTL_OPERATION",
            Self::CtlFanMode => "CTL_FAN_MODE",
        }
    }
}

impl From<FuncCode> for u8 {
    fn from(code: FuncCode) -> u8 {
        code as u8
    }
}

impl TryFrom<u8> for FuncCode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x50 => Ok(Self::Status),
            0x31 => Ok(Self::CtlPower),
            0x32 => Ok(Self::CtlTemperature),
            0x33 => Ok(Self::CtlOperation),
            0x34 => Ok(Self::CtlFanMode),
            _ => Err(Error::UnknownFuncCode(value)),
        }
    }
}

impl fmt::Display for FuncCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:02X})", self.name(), *self as u8)
    }
}

/// Control codes of a STATUS message
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusKind {
    /// Status of one unit
    One = 0x01,

    /// Status of several units
    Multi = 0x0F,

    /// Online units (discovery)
    Online = 0x02,

    /// Status of every unit
    All = 0xFF,
}

impl StatusKind {
    /// Check if messages of this kind carry full status records
    pub fn carries_status(self) -> bool {
        !matches!(self, Self::Online)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::One => "ONE",
            Self::Multi => "MULTI",
            Self::Online => "ONLINE",
            Self::All => "ALL",
        }
    }
}

impl TryFrom<u8> for StatusKind {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x01 => Ok(Self::One),
            0x0F => Ok(Self::Multi),
            0x02 => Ok(Self::Online),
            0xFF => Ok(Self::All),
            _ => Err(Error::UnknownCtlCode {
                func_code: FuncCode::Status.into(),
                ctl_code: value,
            }),
        }
    }
}

/// Control code, typed by the function code it belongs to
///
/// The function code is implied by the variant, so a header can never pair a
/// control value with the wrong message type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CtlCode {
    Status(StatusKind),
    Control(Attribute),
}

impl CtlCode {
    /// Resolve a raw control byte within the domain of `func_code`
    pub fn decode(func_code: FuncCode, raw: u8) -> Result<Self> {
        let unknown = |_| Error::UnknownCtlCode {
            func_code: func_code.into(),
            ctl_code: raw,
        };

        let code = match func_code {
            FuncCode::Status => Self::Status(StatusKind::try_from(raw)?),
            FuncCode::CtlPower => {
                Self::Control(Attribute::Power(Switch::try_from(raw).map_err(unknown)?))
            }
            FuncCode::CtlTemperature => Self::Control(Attribute::TargetTemperature(raw)),
            FuncCode::CtlOperation => {
                Self::Control(Attribute::Operation(Operation::try_from(raw).map_err(unknown)?))
            }
            FuncCode::CtlFanMode => {
                Self::Control(Attribute::FanMode(FanMode::try_from(raw).map_err(unknown)?))
            }
        };

        Ok(code)
    }

    /// Function code this control code belongs to
    pub fn func_code(self) -> FuncCode {
        match self {
            Self::Status(_) => FuncCode::Status,
            Self::Control(Attribute::Power(_)) => FuncCode::CtlPower,
            Self::Control(Attribute::TargetTemperature(_)) => FuncCode::CtlTemperature,
            Self::Control(Attribute::Operation(_)) => FuncCode::CtlOperation,
            Self::Control(Attribute::FanMode(_)) => FuncCode::CtlFanMode,
        }
    }

    /// Raw control byte
    pub fn raw(self) -> u8 {
        match self {
            Self::Status(kind) => kind as u8,
            Self::Control(attribute) => attribute.value(),
        }
    }
}

impl fmt::Display for CtlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(kind) => f.write_str(kind.name()),
            Self::Control(attribute) => write!(f, "{}", attribute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_func_code_conversion() {
        assert_eq!(u8::from(FuncCode::Status), 0x50);
        assert_eq!(FuncCode::try_from(0x33).unwrap(), FuncCode::CtlOperation);
        assert_eq!(FuncCode::try_from(0x35), Err(Error::UnknownFuncCode(0x35)));
    }

    #[test]
    fn test_func_code_is_control() {
        assert!(!FuncCode::Status.is_control());
        assert!(FuncCode::CtlFanMode.is_control());
    }

    #[test]
    fn test_status_ctl_codes() {
        assert_eq!(
            CtlCode::decode(FuncCode::Status, 0x02).unwrap(),
            CtlCode::Status(StatusKind::Online)
        );
        assert_eq!(
            CtlCode::decode(FuncCode::Status, 0x0F).unwrap(),
            CtlCode::Status(StatusKind::Multi)
        );
        assert!(CtlCode::decode(FuncCode::Status, 0x03).is_err());
    }

    #[test]
    fn test_control_ctl_codes_follow_func_domain() {
        assert_eq!(
            CtlCode::decode(FuncCode::CtlPower, 0x01).unwrap(),
            CtlCode::Control(Attribute::Power(Switch::On))
        );
        assert_eq!(
            CtlCode::decode(FuncCode::CtlPower, 0x02),
            Err(Error::UnknownCtlCode { func_code: 0x31, ctl_code: 0x02 })
        );
        assert_eq!(
            CtlCode::decode(FuncCode::CtlTemperature, 0xC8).unwrap(),
            CtlCode::Control(Attribute::TargetTemperature(0xC8))
        );
        assert!(CtlCode::decode(FuncCode::CtlOperation, 0x03).is_err());
        assert!(CtlCode::decode(FuncCode::CtlFanMode, 0x06).is_err());
    }

    #[test]
    fn test_ctl_code_implies_func_code() {
        for (func, raw) in [
            (FuncCode::Status, 0xFF),
            (FuncCode::CtlPower, 0x00),
            (FuncCode::CtlTemperature, 26),
            (FuncCode::CtlOperation, 0x08),
            (FuncCode::CtlFanMode, 0x03),
        ] {
            let code = CtlCode::decode(func, raw).unwrap();
            assert_eq!(code.func_code(), func);
            assert_eq!(code.raw(), raw);
        }
    }
}
