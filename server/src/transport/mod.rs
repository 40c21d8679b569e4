mod tcp;

pub use tcp::{TcpLink, TcpTransport};

use std::fmt;

use crate::{error::ConnectionError, packet::Packet};

/// Opaque `(host, port)` pair locating the dispatcher
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DispatcherAddr {
    pub host: String,
    pub port: u16,
}

impl DispatcherAddr {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }
}

impl fmt::Display for DispatcherAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Establishes links to the dispatcher
pub trait Transport: Send + Sync {
    /// Blocks until the link is up or the attempt has failed
    fn dial(&self, addr: &DispatcherAddr) -> Result<Box<dyn Link>, ConnectionError>;
}

/// One established, framed link to the dispatcher.
///
/// `read_packet` is only ever called from a single receive loop, while
/// `write_bytes` may be called from any number of threads at once, so
/// implementations must serialize writes themselves.
pub trait Link: Send + Sync {
    /// Blocks until one whole frame has arrived
    fn read_packet(&self) -> Result<Packet, ConnectionError>;
    /// Writes already-framed bytes
    fn write_bytes(&self, bytes: &[u8]) -> Result<(), ConnectionError>;
    /// Releases the underlying transport, unblocking any pending read
    fn close(&self);
}
