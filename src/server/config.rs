use std::net::SocketAddr;
use std::time::Duration;

/// The reference server's fixed listen port.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Every read drains at most this many bytes before decoding. Payloads
/// larger than this arrive as several separate emissions.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Bounded timeout both loops pass to their poller each iteration.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

pub const DEFAULT_EVENTS_CAPACITY: usize = 1024;

/// Configuration for the server.
///
/// The binary runs on the defaults; the builder exists mainly so tests can
/// bind an ephemeral port.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listening socket to.
    pub addr: SocketAddr,
    /// Poll timeout used by both the accept loop and the read loop.
    pub poll_timeout: Duration,
    /// Maximum number of events drained per poll cycle.
    pub events_capacity: usize,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::new()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.parse().unwrap(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            events_capacity: DEFAULT_EVENTS_CAPACITY,
        }
    }
}

/// Builder for [`ServerConfig`]. Unset fields fall back to the defaults.
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    poll_timeout: Option<Duration>,
    events_capacity: Option<usize>,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self {
            addr: None,
            poll_timeout: None,
            events_capacity: None,
        }
    }

    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = Some(timeout);
        self
    }

    pub fn events_capacity(mut self, capacity: usize) -> Self {
        self.events_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> ServerConfig {
        let default = ServerConfig::default();
        ServerConfig {
            addr: self.addr.unwrap_or(default.addr),
            poll_timeout: self.poll_timeout.unwrap_or(default.poll_timeout),
            events_capacity: self.events_capacity.unwrap_or(default.events_capacity),
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
