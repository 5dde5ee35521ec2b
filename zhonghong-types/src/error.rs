pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid {field} value: 0x{value:02X}")]
    InvalidValue {
        field: &'static str,
        value: u8,
    },
}
