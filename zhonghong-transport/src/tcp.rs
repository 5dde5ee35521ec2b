//! TCP transport

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{error::*, Link, Transport};

/// TCP keepalive timings
///
/// The gateway never speaks unless asked, so a dead peer is only noticed
/// through keepalive probes. With the defaults a half-open socket is dropped
/// after roughly 16 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keepalive {
    /// Idle time before the first probe
    pub idle: Duration,

    /// Time between probes
    pub interval: Duration,

    /// Unanswered probes before the connection is dropped
    pub retries: u32,
}

impl Default for Keepalive {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(1),
            interval: Duration::from_secs(3),
            retries: 5,
        }
    }
}

impl Keepalive {
    fn to_socket_option(self) -> TcpKeepalive {
        let keepalive = TcpKeepalive::new()
            .with_time(self.idle)
            .with_interval(self.interval);

        #[cfg(not(windows))]
        let keepalive = keepalive.with_retries(self.retries);

        keepalive
    }
}

/// TCP transport for Zhonghong gateways
pub struct TcpTransport {
    addr: String,
    port: u16,
    connect_timeout: Duration,
    keepalive: Option<Keepalive>,
}

impl TcpTransport {
    /// Create new TCP transport
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            connect_timeout: Duration::from_secs(5),
            keepalive: Some(Keepalive::default()),
        }
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set TCP keepalive timings, `None` disables keepalive
    pub fn with_keepalive(mut self, keepalive: Option<Keepalive>) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Resolve address to SocketAddr
    ///
    /// Resolved on every connect so a gateway that changed address is found
    /// again after a reconnect.
    async fn resolve_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.addr, self.port);

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&addr_str)
            .await
            .map_err(|e| Error::InvalidAddress(format!("{}: {}", addr_str, e)))?
            .collect();

        addrs
            .first()
            .copied()
            .ok_or_else(|| Error::InvalidAddress(format!("No addresses found for {}", addr_str)))
    }

    async fn open_stream(&self, addr: SocketAddr) -> Result<TcpStream> {
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };

        let stream = timeout(self.connect_timeout, socket.connect(addr))
            .await
            .map_err(|_| Error::ConnectionTimeout)??;

        // Frames are tiny, don't let Nagle hold them back
        stream.set_nodelay(true)?;

        if let Some(keepalive) = self.keepalive {
            let socket = SockRef::from(&stream);
            if let Err(e) = socket.set_tcp_keepalive(&keepalive.to_socket_option()) {
                warn!("TCP keepalive not supported: {}", e);
            }
        }

        Ok(stream)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self) -> Result<Link> {
        let addr = self.resolve_addr().await?;

        debug!("Connecting to {}...", addr);

        let stream = self.open_stream(addr).await?;

        debug!("Connected to {}", addr);

        let (reader, writer) = stream.into_split();
        Ok(Link::new(reader, writer, addr.to_string()))
    }

    fn remote_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}
