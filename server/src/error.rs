use thiserror::Error;

/// Errors raised by the transport underneath a DispatcherConnection.
///
/// Always recoverable: the supervisor closes the connection and redials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The dispatcher could not be reached
    #[error("Failed to connect to dispatcher at {addr}: {reason}")]
    Dial { addr: String, reason: String },

    /// Reading from the transport failed
    #[error("Failed to read from dispatcher: {reason}")]
    Read { reason: String },

    /// Writing to the transport failed
    #[error("Failed to write {len} bytes to dispatcher: {reason}")]
    Write { len: usize, reason: String },

    /// The transport was closed, locally or by the dispatcher
    #[error("Dispatcher connection closed")]
    Closed,

    /// A frame header could not be decoded (possible malformed data)
    #[error("Malformed frame from dispatcher: {reason}")]
    MalformedFrame { reason: String },

    /// A frame announced a size above the allowed maximum
    #[error("Frame of {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },
}

/// Errors observed by code sending through the shared connection slot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// No dispatcher connection is currently published
    #[error("Dispatcher not connected")]
    NotConnected,

    /// The published connection failed while sending
    #[error("Send failed: {0}")]
    Connection(#[from] ConnectionError),
}
