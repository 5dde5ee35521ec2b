//! Gateway connection settings

use std::time::Duration;

use zhonghong_core::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_RECONNECT_DELAY_MS,
    DEFAULT_WRITE_TIMEOUT, DISCOVERY_ATTEMPTS, MAX_RETRIES, SOCKET_BUFSIZE,
};
use zhonghong_core::DEFAULT_PORT;
use zhonghong_transport::{Keepalive, TcpTransport};

/// Settings for one gateway session
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use zhonghong::GatewayConfig;
///
/// let config = GatewayConfig::new("192.168.1.50", 9999, 1)
///     .with_write_timeout(Duration::from_secs(3))
///     .with_max_retry(2);
///
/// assert_eq!(config.gateway_address, 1);
/// assert_eq!(config.max_retry, 2);
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Gateway host name or IP
    pub host: String,

    /// Gateway TCP port
    pub port: u16,

    /// Gateway address byte put into every header
    pub gateway_address: u8,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Deadline for writing one frame
    pub write_timeout: Duration,

    /// Deadline for a reply during request/reply exchanges
    pub read_timeout: Duration,

    /// Pause between closing a socket and reopening it
    pub reconnect_delay: Duration,

    /// Reopen-and-retry cycles for a failed write
    pub max_retry: usize,

    /// Request/reply rounds during discovery
    pub discovery_attempts: usize,

    /// Maximum bytes taken from the socket per read
    pub read_buffer_size: usize,

    /// TCP keepalive timings, `None` to leave keepalive off
    pub keepalive: Option<Keepalive>,
}

impl GatewayConfig {
    pub fn new(host: impl Into<String>, port: u16, gateway_address: u8) -> Self {
        Self {
            host: host.into(),
            port,
            gateway_address,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            write_timeout: Duration::from_secs(DEFAULT_WRITE_TIMEOUT),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT),
            reconnect_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_retry: MAX_RETRIES,
            discovery_attempts: DISCOVERY_ATTEMPTS,
            read_buffer_size: SOCKET_BUFSIZE,
            keepalive: Some(Keepalive::default()),
        }
    }

    /// Gateway on the default port
    pub fn with_default_port(host: impl Into<String>, gateway_address: u8) -> Self {
        Self::new(host, DEFAULT_PORT, gateway_address)
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set write timeout
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set reply timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the pause before reopening a socket
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set the write retry ceiling
    pub fn with_max_retry(mut self, max_retry: usize) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Set the number of discovery rounds
    pub fn with_discovery_attempts(mut self, attempts: usize) -> Self {
        self.discovery_attempts = attempts;
        self
    }

    /// Set the socket read size
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    /// Set TCP keepalive timings
    pub fn with_keepalive(mut self, keepalive: Option<Keepalive>) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// TCP transport matching these settings
    pub fn transport(&self) -> TcpTransport {
        TcpTransport::new(self.host.clone(), self.port)
            .with_connect_timeout(self.connect_timeout)
            .with_keepalive(self.keepalive)
    }
}
