use std::{sync::Arc, time::Duration};

use crate::{
    connection::DispatcherConnection,
    error::SendError,
    packet::Packet,
    slot::ConnectionSlot,
    supervisor::{StateCell, SupervisorState},
};

/// Process-wide handle to the dispatcher, created by the composition root
/// from a [`ConnectionSupervisor`](crate::ConnectionSupervisor) and passed
/// down to whatever needs to send. Cheap to clone.
///
/// Sends made while disconnected fail with `SendError::NotConnected` and are
/// not buffered or replayed after the next reconnect.
#[derive(Clone)]
pub struct DispatcherClient {
    slot: ConnectionSlot,
    state: StateCell,
}

impl DispatcherClient {
    pub(crate) fn new(slot: ConnectionSlot, state: StateCell) -> Self {
        Self { slot, state }
    }

    pub fn slot(&self) -> &ConnectionSlot {
        &self.slot
    }

    pub fn state(&self) -> SupervisorState {
        self.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.slot.is_connected()
    }

    pub fn connection_for_send(&self) -> Result<Arc<DispatcherConnection>, SendError> {
        self.slot.connection_for_send()
    }

    pub fn send(&self, bytes: &[u8]) -> Result<(), SendError> {
        self.slot.send(bytes)
    }

    pub fn send_packet(&self, packet: &Packet) -> Result<(), SendError> {
        self.slot.send_packet(packet)
    }

    pub fn wait_connected(&self, timeout: Duration) -> Option<Arc<DispatcherConnection>> {
        self.slot.wait_connected(timeout)
    }
}
