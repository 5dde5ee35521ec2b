//! Protocol constants

/// Unit count marker meaning "every unit" in bulk requests
pub const ALL_UNITS: u8 = 0xFF;

/// Minimum number of buffered bytes worth scanning (header + checksum)
pub const MIN_FRAME_SCAN: usize = 5;

/// Upper bound on unconsumed bytes carried between socket reads
pub const MAX_PENDING_BYTES: usize = 4096;

/// Default socket read size (bytes)
pub const SOCKET_BUFSIZE: usize = 1024;

/// Default connection timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 5;

/// Default write timeout (seconds)
pub const DEFAULT_WRITE_TIMEOUT: u64 = 10;

/// Default read timeout for request/reply exchanges (seconds)
pub const DEFAULT_READ_TIMEOUT: u64 = 5;

/// Pause before reopening a closed socket (milliseconds)
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;

/// Maximum reopen-and-retry cycles for a failed write
pub const MAX_RETRIES: usize = 5;

/// Maximum request/reply rounds during discovery
pub const DISCOVERY_ATTEMPTS: usize = 10;
