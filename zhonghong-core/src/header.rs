//! Frame header

use std::fmt;

use bytes::BufMut;

use crate::{
    codes::{CtlCode, FuncCode, StatusKind},
    error::{Error, Result},
    record::{OnlineRecord, StatusRecord},
};
use zhonghong_types::Address;

/// Frame header
///
/// # Layout
///
/// ```text
/// ┌─────────────┬─────────────┬─────────────┬─────────────┐
/// │  Gateway    │  Function   │  Control    │ Unit count  │
/// │  1 byte     │  1 byte     │  1 byte     │  1 byte     │
/// └─────────────┴─────────────┴─────────────┴─────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    /// Gateway address the frame is for (or from)
    pub gateway_address: u8,

    /// Control code; also determines the function code
    pub ctl_code: CtlCode,

    /// Number of payload records (or `ALL_UNITS` in bulk requests)
    pub unit_count: u8,
}

impl Header {
    /// Header size in bytes
    pub const SIZE: usize = 4;

    /// Checksum trailer size in bytes
    pub const CHECKSUM_SIZE: usize = 1;

    pub fn new(gateway_address: u8, ctl_code: CtlCode, unit_count: u8) -> Self {
        Self {
            gateway_address,
            ctl_code,
            unit_count,
        }
    }

    /// Build a STATUS header
    pub fn status(gateway_address: u8, kind: StatusKind, unit_count: u8) -> Self {
        Self::new(gateway_address, CtlCode::Status(kind), unit_count)
    }

    /// Function code
    pub fn func_code(&self) -> FuncCode {
        self.ctl_code.func_code()
    }

    /// Decode the first four bytes of `buf`
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` if fewer than four bytes are available
    /// - `UnknownFuncCode` / `UnknownCtlCode` if the codes do not resolve
    ///
    /// # Examples
    ///
    /// ```
    /// use zhonghong_core::{FuncCode, Header};
    ///
    /// let header = Header::decode(&[0x01, 0x50, 0x02, 0x03]).unwrap();
    /// assert_eq!(header.func_code(), FuncCode::Status);
    /// assert_eq!(header.payload_len(), 9);
    /// ```
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(Error::MalformedHeader {
                expected: Self::SIZE,
                actual: buf.len(),
            });
        }

        let func_code = FuncCode::try_from(buf[1])?;
        let ctl_code = CtlCode::decode(func_code, buf[2])?;

        Ok(Self::new(buf[0], ctl_code, buf[3]))
    }

    /// Raw header bytes
    pub fn to_bytes(&self) -> [u8; 4] {
        [
            self.gateway_address,
            self.func_code().into(),
            self.ctl_code.raw(),
            self.unit_count,
        ]
    }

    /// Append the header to `buf`
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.to_bytes());
    }

    /// Size of the payload that follows a header of this shape
    ///
    /// The lookup is total: an unknown (function, control) pair never makes
    /// it past [`Header::decode`].
    pub fn payload_len(&self) -> usize {
        let record_size = match self.ctl_code {
            CtlCode::Status(kind) if kind.carries_status() => StatusRecord::SIZE,
            CtlCode::Status(_) => OnlineRecord::SIZE,
            CtlCode::Control(_) => Address::SIZE,
        };

        record_size * usize::from(self.unit_count)
    }

    /// Total frame size: header, payload and checksum
    pub fn frame_len(&self) -> usize {
        Self::SIZE + self.payload_len() + Self::CHECKSUM_SIZE
    }

    /// Check if `other` answers the same request
    ///
    /// Compares gateway address, function code and control code. The unit
    /// count is ignored: bulk requests carry a marker there and the reply
    /// carries the real number of records.
    pub fn matches(&self, other: &Header) -> bool {
        self.gateway_address == other.gateway_address && self.ctl_code == other.ctl_code
    }

    /// Check if this header announces status records
    pub fn is_status_update(&self) -> bool {
        matches!(self.ctl_code, CtlCode::Status(kind) if kind.carries_status())
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Header[gw={}, func={}, ctl={}, units={}]",
            self.gateway_address,
            self.func_code(),
            self.ctl_code,
            self.unit_count
        )
    }
}
