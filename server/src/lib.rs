//! # Meridian Server
//! The worker-process side of the dispatcher link: a supervisor that keeps
//! one live connection to the dispatcher process published in a lock-free
//! slot, redials forever after any failure, and hands every inbound message
//! to an application delegate in wire order.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod transport;
pub mod shared {
    pub use meridian_shared::{
        AttrChange, AttrKey, AttrNode, AttrPath, AttributeError, AttributeOwner, AttributeValue,
        FromAttribute, ListNode, MapNode, PlainValue, VisibilityFlag,
    };
}

mod client;
mod config;
mod connection;
mod delegate;
mod error;
mod packet;
mod slot;
mod supervisor;

pub use client::DispatcherClient;
pub use config::DispatcherClientConfig;
pub use connection::DispatcherConnection;
pub use delegate::DispatcherClientDelegate;
pub use error::{ConnectionError, SendError};
pub use packet::{MsgType, Packet, MAX_PACKET_SIZE, MSG_TYPE_SIZE, SIZE_FIELD_SIZE};
pub use slot::ConnectionSlot;
pub use supervisor::{ConnectionSupervisor, SupervisorState};
