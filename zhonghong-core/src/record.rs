//! Payload records

use std::fmt;

use bytes::BufMut;
use zhonghong_types::{Address, FanMode, Operation, Switch};

use crate::error::{Error, Result};

fn check_len(buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(Error::RecordLength {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Status of one indoor unit
///
/// # Layout
///
/// ```text
/// ┌─────┬─────┬────────┬────────┬──────┬─────┬──────┬───────┬──────────┐
/// │ out │ in  │ switch │ target │ mode │ fan │ room │ error │ reserved │
/// │ 1B  │ 1B  │   1B   │   1B   │  1B  │ 1B  │  1B  │  1B   │    2B    │
/// └─────┴─────┴────────┴────────┴──────┴─────┴──────┴───────┴──────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusRecord {
    pub address: Address,
    pub switch: Switch,
    pub target_temperature: u8,
    pub operation: Operation,
    pub fan_mode: FanMode,
    pub room_temperature: u8,
    pub error_code: u8,
    pub reserved: [u8; 2],
}

impl StatusRecord {
    /// Wire size in bytes
    pub const SIZE: usize = 10;

    /// Decode a record from the first [`StatusRecord::SIZE`] bytes of `buf`
    ///
    /// The switch byte is read modulo 2; operation and fan mode must be in
    /// their value tables.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;

        Ok(Self {
            address: Address::new(buf[0], buf[1]),
            switch: Switch::from_raw(buf[2]),
            target_temperature: buf[3],
            operation: Operation::try_from(buf[4])?,
            fan_mode: FanMode::try_from(buf[5])?,
            room_temperature: buf[6],
            error_code: buf[7],
            reserved: [buf[8], buf[9]],
        })
    }

    pub fn to_bytes(&self) -> [u8; 10] {
        [
            self.address.outdoor,
            self.address.indoor,
            self.switch.into(),
            self.target_temperature,
            self.operation.into(),
            self.fan_mode.into(),
            self.room_temperature,
            self.error_code,
            self.reserved[0],
            self.reserved[1],
        ]
    }

    pub fn is_on(&self) -> bool {
        self.switch == Switch::On
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} power {}, operation {}, fan {}, target {}, room {}, error {}",
            self.address,
            self.switch,
            self.operation,
            self.fan_mode,
            self.target_temperature,
            self.room_temperature,
            self.error_code
        )
    }
}

/// Online flag of one indoor unit, as reported by discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnlineRecord {
    pub address: Address,
    pub online: u8,
}

impl OnlineRecord {
    /// Wire size in bytes
    pub const SIZE: usize = 3;

    /// Decode a record from the first [`OnlineRecord::SIZE`] bytes of `buf`
    pub fn decode(buf: &[u8]) -> Result<Self> {
        check_len(buf, Self::SIZE)?;

        Ok(Self {
            address: Address::new(buf[0], buf[1]),
            online: buf[2],
        })
    }

    pub fn to_bytes(&self) -> [u8; 3] {
        [self.address.outdoor, self.address.indoor, self.online]
    }
}

impl fmt::Display for OnlineRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} online_status: {}", self.address, self.online)
    }
}

/// One payload record of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Record {
    Status(StatusRecord),
    Online(OnlineRecord),

    /// Bare unit address: the target of a request, or the echo of a control
    /// command
    Address(Address),
}

impl Record {
    /// Address the record refers to
    pub fn address(&self) -> Address {
        match self {
            Self::Status(status) => status.address,
            Self::Online(online) => online.address,
            Self::Address(address) => *address,
        }
    }

    /// Wire size in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::Status(_) => StatusRecord::SIZE,
            Self::Online(_) => OnlineRecord::SIZE,
            Self::Address(_) => Address::SIZE,
        }
    }

    /// Append the record to `buf`
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        match self {
            Self::Status(status) => buf.put_slice(&status.to_bytes()),
            Self::Online(online) => buf.put_slice(&online.to_bytes()),
            Self::Address(address) => buf.put_slice(&address.to_bytes()),
        }
    }
}

impl From<StatusRecord> for Record {
    fn from(record: StatusRecord) -> Self {
        Self::Status(record)
    }
}

impl From<OnlineRecord> for Record {
    fn from(record: OnlineRecord) -> Self {
        Self::Online(record)
    }
}

impl From<Address> for Record {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => fmt::Display::fmt(status, f),
            Self::Online(online) => fmt::Display::fmt(online, f),
            Self::Address(address) => fmt::Display::fmt(address, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_record_decode() {
        let record = StatusRecord::decode(&[1, 2, 1, 24, 1, 2, 26, 0, 0, 0]).unwrap();

        assert_eq!(record.address, Address::new(1, 2));
        assert_eq!(record.switch, Switch::On);
        assert_eq!(record.target_temperature, 24);
        assert_eq!(record.operation, Operation::Cool);
        assert_eq!(record.fan_mode, FanMode::Mid);
        assert_eq!(record.room_temperature, 26);
        assert_eq!(record.error_code, 0);
    }

    #[test]
    fn test_status_record_switch_is_low_bit() {
        let record = StatusRecord::decode(&[1, 2, 0x03, 24, 1, 2, 26, 0, 0, 0]).unwrap();
        assert!(record.is_on());

        let record = StatusRecord::decode(&[1, 2, 0x02, 24, 1, 2, 26, 0, 0, 0]).unwrap();
        assert!(!record.is_on());
    }

    #[test]
    fn test_status_record_invalid_operation() {
        let result = StatusRecord::decode(&[1, 2, 1, 24, 0x10, 2, 26, 0, 0, 0]);
        assert!(matches!(result, Err(Error::InvalidFieldValue(_))));
    }

    #[test]
    fn test_status_record_invalid_fan_mode() {
        let result = StatusRecord::decode(&[1, 2, 1, 24, 1, 0, 26, 0, 0, 0]);
        assert!(matches!(result, Err(Error::InvalidFieldValue(_))));
    }

    #[test]
    fn test_status_record_keeps_reserved_bytes() {
        let bytes = [1, 2, 1, 24, 8, 5, 26, 3, 0xAA, 0x55];
        let record = StatusRecord::decode(&bytes).unwrap();
        assert_eq!(record.to_bytes(), bytes);
    }

    #[test]
    fn test_online_record() {
        let record = OnlineRecord::decode(&[1, 3, 1]).unwrap();
        assert_eq!(record.address, Address::new(1, 3));
        assert_eq!(record.online, 1);
        assert_eq!(record.to_bytes(), [1, 3, 1]);
    }

    #[test]
    fn test_record_sizes() {
        assert_eq!(Record::Address(Address::new(1, 1)).size(), 2);
        assert_eq!(Record::Online(OnlineRecord::decode(&[1, 1, 1]).unwrap()).size(), 3);
    }

    #[test]
    fn test_short_records_are_rejected() {
        assert_eq!(
            StatusRecord::decode(&[1, 2, 1, 24]),
            Err(Error::RecordLength {
                expected: 10,
                actual: 4
            })
        );
        assert_eq!(
            OnlineRecord::decode(&[1]),
            Err(Error::RecordLength {
                expected: 3,
                actual: 1
            })
        );
        assert!(StatusRecord::decode(&[]).is_err());
    }
}
