//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] zhonghong_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zhonghong_transport::Error),

    #[error("Type error: {0}")]
    Types(#[from] zhonghong_types::Error),

    #[error("Operation not allowed while the listener is running")]
    AlreadyListening,
}
