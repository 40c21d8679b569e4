use std::{
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

use arc_swap::ArcSwapOption;

use crate::{connection::DispatcherConnection, error::SendError, packet::Packet};

/// Process-wide holder of the current dispatcher connection.
///
/// Readers load the slot without taking a lock and always see either a
/// whole connection or nothing. Clones share the same slot.
#[derive(Clone, Default)]
pub struct ConnectionSlot {
    current: Arc<ArcSwapOption<DispatcherConnection>>,
    published: Arc<(Mutex<()>, Condvar)>,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection published right now, if any
    pub fn current(&self) -> Option<Arc<DispatcherConnection>> {
        self.current.load_full()
    }

    pub fn is_connected(&self) -> bool {
        self.current.load().is_some()
    }

    /// Atomically replaces the current connection, returning the previous one
    pub fn publish(&self, connection: Arc<DispatcherConnection>) -> Option<Arc<DispatcherConnection>> {
        let previous = self.current.swap(Some(connection));
        let (lock, condvar) = &*self.published;
        let _guard = lock.lock();
        condvar.notify_all();
        previous
    }

    /// Empties the slot, returning the connection it held
    pub fn clear(&self) -> Option<Arc<DispatcherConnection>> {
        self.current.swap(None)
    }

    /// The current connection, or `NotConnected` while the slot is empty
    pub fn connection_for_send(&self) -> Result<Arc<DispatcherConnection>, SendError> {
        self.current().ok_or(SendError::NotConnected)
    }

    pub fn send(&self, bytes: &[u8]) -> Result<(), SendError> {
        self.connection_for_send()?.send(bytes)?;
        Ok(())
    }

    pub fn send_packet(&self, packet: &Packet) -> Result<(), SendError> {
        self.connection_for_send()?.send_packet(packet)?;
        Ok(())
    }

    /// Blocks until a connection is published or `timeout` elapses
    pub fn wait_connected(&self, timeout: Duration) -> Option<Arc<DispatcherConnection>> {
        let deadline = Instant::now() + timeout;
        let (lock, condvar) = &*self.published;
        let Ok(mut guard) = lock.lock() else {
            return self.current();
        };
        loop {
            if let Some(connection) = self.current() {
                return Some(connection);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            guard = match condvar.wait_timeout(guard, deadline - now) {
                Ok((guard, _)) => guard,
                Err(_) => return self.current(),
            };
        }
    }
}
