//! Error types for zhonghong-core

/// Result type alias for zhonghong-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core protocol errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Not enough bytes for a header
    #[error("Malformed header: expected at least {expected} bytes, got {actual} bytes")]
    MalformedHeader {
        expected: usize,
        actual: usize,
    },

    /// Function code is not one of the known message types
    #[error("Unknown function code: 0x{0:02X}")]
    UnknownFuncCode(u8),

    /// Control code is not valid for the function code it came with
    #[error("Unknown control code 0x{ctl_code:02X} for function code 0x{func_code:02X}")]
    UnknownCtlCode {
        func_code: u8,
        ctl_code: u8,
    },

    /// Checksum verification failed
    #[error("Checksum mismatch: expected 0x{expected:02X}, received 0x{received:02X}")]
    ChecksumMismatch {
        expected: u8,
        received: u8,
    },

    /// Frame length disagrees with what its header announces
    #[error("Frame length mismatch: header announces {expected} bytes, got {actual} bytes")]
    FrameLength {
        expected: usize,
        actual: usize,
    },

    /// Too few bytes for a payload record
    #[error("Record too short: expected {expected} bytes, got {actual} bytes")]
    RecordLength {
        expected: usize,
        actual: usize,
    },

    /// Valid header, but a payload shape this client does not handle
    #[error("Unsupported message shape: func 0x{func_code:02X}, ctl 0x{ctl_code:02X}, units {unit_count}")]
    UnsupportedMessageShape {
        func_code: u8,
        ctl_code: u8,
        unit_count: u8,
    },

    /// A payload byte is outside its value table
    #[error("Invalid field value: {0}")]
    InvalidFieldValue(#[from] zhonghong_types::Error),

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Check if the scanner should slide one byte forward and look for a
    /// header again
    pub fn is_resync(&self) -> bool {
        matches!(
            self,
            Self::UnknownFuncCode(_) | Self::UnknownCtlCode { .. }
        )
    }
}
