use std::{
    fmt,
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use log::trace;

use crate::{
    error::ConnectionError,
    packet::{MsgType, Packet},
    transport::{DispatcherAddr, Link},
};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A single logical connection to the dispatcher process.
///
/// Shared as `Arc<DispatcherConnection>`: any number of threads may `send`
/// concurrently, while only the supervisor's receive loop calls `receive`.
pub struct DispatcherConnection {
    id: u64,
    addr: DispatcherAddr,
    link: Box<dyn Link>,
    closed: AtomicBool,
}

impl DispatcherConnection {
    pub fn new(addr: DispatcherAddr, link: Box<dyn Link>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            addr,
            link,
            closed: AtomicBool::new(false),
        }
    }

    /// Process-unique id, distinct for every (re)connect
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn addr(&self) -> &DispatcherAddr {
        &self.addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Writes already-framed bytes to the dispatcher
    pub fn send(&self, bytes: &[u8]) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        self.link.write_bytes(bytes)
    }

    /// Frames `packet` and writes it to the dispatcher
    pub fn send_packet(&self, packet: &Packet) -> Result<(), ConnectionError> {
        let frame = packet.encode()?;
        self.send(&frame)
    }

    /// Blocks until the next whole message arrives
    pub fn receive(&self) -> Result<(MsgType, Packet), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        let packet = self.link.read_packet()?;
        trace!("{}: received msg type {} ({} bytes)", self, packet.msg_type(), packet.payload().len());
        Ok((packet.msg_type(), packet))
    }

    /// Releases the transport. Calling it more than once is harmless.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.link.close();
        }
    }
}

impl fmt::Display for DispatcherConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DispatcherConnection<{}@{}>", self.id, self.addr)
    }
}

impl fmt::Debug for DispatcherConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConnection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}
