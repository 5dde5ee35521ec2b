//! Transport errors

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Read timeout")]
    ReadTimeout,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("Connection reset: {0}")]
    ConnectionReset(#[source] io::Error),

    #[error("Connection broken: {0}")]
    ConnectionBroken(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                Self::ConnectionReset(e)
            }
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => Self::ConnectionBroken(e),
            _ => Self::Io(e),
        }
    }
}

impl Error {
    /// Check if the socket has to be reopened before it can be used again
    pub fn requires_reconnect(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::ConnectionClosed
                | Self::ConnectionReset(_)
                | Self::ConnectionBroken(_)
                | Self::Io(_)
        )
    }

    /// Check if error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ConnectionTimeout | Self::WriteTimeout | Self::ReadTimeout
        )
    }
}
