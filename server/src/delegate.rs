use crate::packet::{MsgType, Packet};

/// Application-side hooks driven by the connection supervisor
pub trait DispatcherClientDelegate: Send + Sync {
    /// Called once after every successful (re)connect, once the new
    /// connection is already published
    fn on_dispatcher_connected(&self);

    /// Called once per inbound message, in wire order, from the receive
    /// loop. The next message is not read until this returns.
    fn handle_dispatcher_packet(&self, msg_type: MsgType, packet: Packet);
}
