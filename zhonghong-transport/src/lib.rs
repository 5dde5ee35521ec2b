//! Transport layer for the Zhonghong gateway protocol
//!
//! A [`Transport`] opens a [`Link`]: a byte stream split into a reading half
//! and a writing half, so one task can block on reads while others write.

pub mod error;
pub mod tcp;

pub use error::{Error, Result};
pub use tcp::{Keepalive, TcpTransport};

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::trace;

/// Transport trait for different ways of reaching a gateway
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a new link to the gateway
    async fn connect(&self) -> Result<Link>;

    /// Get remote address
    fn remote_addr(&self) -> String;
}

/// An open connection, split into halves
pub struct Link {
    pub reader: LinkReader,
    pub writer: LinkWriter,
}

impl Link {
    /// Build a link from any pair of async byte streams
    pub fn new(
        reader: impl AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
        peer: impl Into<String>,
    ) -> Self {
        let peer = peer.into();
        Self {
            reader: LinkReader {
                inner: Box::new(reader),
                peer: peer.clone(),
            },
            writer: LinkWriter {
                inner: Box::new(writer),
                peer,
            },
        }
    }
}

/// Reading half of a [`Link`]
pub struct LinkReader {
    inner: Box<dyn AsyncRead + Send + Unpin>,
    peer: String,
}

impl LinkReader {
    /// Receive up to `max_len` bytes
    ///
    /// Waits forever when `timeout_after` is `None`. A zero-length read means
    /// the remote closed the stream and is reported as
    /// [`Error::ConnectionClosed`].
    pub async fn receive(
        &mut self,
        max_len: usize,
        timeout_after: Option<Duration>,
    ) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(max_len);

        let n = match timeout_after {
            Some(duration) => timeout(duration, self.inner.read_buf(&mut buf))
                .await
                .map_err(|_| Error::ReadTimeout)??,
            None => self.inner.read_buf(&mut buf).await?,
        };

        if n == 0 {
            return Err(Error::ConnectionClosed);
        }

        trace!("Received {} bytes from {}: {:02X?}", n, self.peer, &buf[..n.min(32)]);

        Ok(buf)
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

/// Writing half of a [`Link`]
pub struct LinkWriter {
    inner: Box<dyn AsyncWrite + Send + Unpin>,
    peer: String,
}

impl LinkWriter {
    /// Write all of `data` and flush, giving up after `timeout_after`
    pub async fn send(&mut self, data: &[u8], timeout_after: Duration) -> Result<()> {
        trace!(
            "Sending {} bytes to {}: {:02X?}",
            data.len(),
            self.peer,
            &data[..data.len().min(32)]
        );

        let inner = &mut self.inner;
        timeout(timeout_after, async move {
            inner.write_all(data).await?;
            inner.flush().await
        })
        .await
        .map_err(|_| Error::WriteTimeout)??;

        Ok(())
    }

    /// Shut down the write direction; errors are ignored
    pub async fn shutdown(&mut self) {
        let _ = self.inner.shutdown().await;
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct BrokenPipe;

    impl AsyncWrite for BrokenPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_link_round_trip() {
        let (local, remote) = tokio::io::duplex(64);
        let (local_read, local_write) = tokio::io::split(local);
        let (remote_read, remote_write) = tokio::io::split(remote);

        let mut a = Link::new(local_read, local_write, "a");
        let mut b = Link::new(remote_read, remote_write, "b");

        a.writer.send(&[1, 2, 3], Duration::from_secs(1)).await.unwrap();
        let received = b.reader.receive(16, Some(Duration::from_secs(1))).await.unwrap();

        assert_eq!(&received[..], &[1, 2, 3]);
        assert_eq!(a.reader.peer(), "a");
    }

    #[tokio::test]
    async fn test_receive_closed() {
        let mut link = Link::new(tokio::io::empty(), tokio::io::sink(), "closed");

        let result = link.reader.receive(16, None).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_timeout() {
        let (local, _remote) = tokio::io::duplex(64);
        let (read, write) = tokio::io::split(local);
        let mut link = Link::new(read, write, "idle");

        let result = link.reader.receive(16, Some(Duration::from_secs(5))).await;
        assert!(matches!(result, Err(Error::ReadTimeout)));
    }

    #[tokio::test]
    async fn test_send_broken_pipe() {
        let mut link = Link::new(tokio::io::empty(), BrokenPipe, "broken");

        let result = link.writer.send(&[1], Duration::from_secs(1)).await;
        let err = result.unwrap_err();
        assert!(matches!(err, Error::ConnectionBroken(_)));
        assert!(err.requires_reconnect());
    }
}
