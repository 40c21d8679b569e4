use std::io::{self, ErrorKind, Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ConnectionError;

/// Identifies how a packet's payload should be interpreted
pub type MsgType = u16;

/// Bytes in the length prefix of every frame
pub const SIZE_FIELD_SIZE: usize = 4;
/// Bytes taken by the message type at the start of every frame body
pub const MSG_TYPE_SIZE: usize = 2;
/// Largest frame body accepted from or sent to the dispatcher
pub const MAX_PACKET_SIZE: usize = 25 * 1024 * 1024;

/// A single message exchanged with the dispatcher.
///
/// On the wire: `[u32 LE body length][u16 LE msg type][payload]`, where the
/// body is the message type plus payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {
    msg_type: MsgType,
    payload: Vec<u8>,
}

impl Packet {
    pub fn new(msg_type: MsgType, payload: Vec<u8>) -> Self {
        Self { msg_type, payload }
    }

    pub fn msg_type(&self) -> MsgType {
        self.msg_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Frames this packet for the wire
    pub fn encode(&self) -> Result<Bytes, ConnectionError> {
        let body_len = MSG_TYPE_SIZE + self.payload.len();
        if body_len > MAX_PACKET_SIZE {
            return Err(ConnectionError::FrameTooLarge {
                size: body_len,
                max: MAX_PACKET_SIZE,
            });
        }

        let mut frame = BytesMut::with_capacity(SIZE_FIELD_SIZE + body_len);
        frame.put_u32_le(body_len as u32);
        frame.put_u16_le(self.msg_type);
        frame.put_slice(&self.payload);
        Ok(frame.freeze())
    }

    /// Blocks until one whole frame has been read from `reader`
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, ConnectionError> {
        let mut size_buf = [0u8; SIZE_FIELD_SIZE];
        reader.read_exact(&mut size_buf).map_err(read_error)?;
        let body_len = (&size_buf[..]).get_u32_le() as usize;

        if body_len < MSG_TYPE_SIZE {
            return Err(ConnectionError::MalformedFrame {
                reason: format!("body of {} bytes cannot hold a message type", body_len),
            });
        }
        if body_len > MAX_PACKET_SIZE {
            return Err(ConnectionError::FrameTooLarge {
                size: body_len,
                max: MAX_PACKET_SIZE,
            });
        }

        let mut body = BytesMut::zeroed(body_len);
        reader.read_exact(&mut body).map_err(read_error)?;
        let msg_type = body.get_u16_le();

        Ok(Self {
            msg_type,
            payload: body.to_vec(),
        })
    }

    /// Frames this packet and writes it to `writer` in one call
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), ConnectionError> {
        let frame = self.encode()?;
        writer
            .write_all(&frame)
            .and_then(|_| writer.flush())
            .map_err(|error| write_error(frame.len(), error))
    }
}

pub(crate) fn read_error(error: io::Error) -> ConnectionError {
    match error.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
            ConnectionError::Closed
        }
        _ => ConnectionError::Read {
            reason: error.to_string(),
        },
    }
}

pub(crate) fn write_error(len: usize, error: io::Error) -> ConnectionError {
    match error.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => {
            ConnectionError::Closed
        }
        _ => ConnectionError::Write {
            len,
            reason: error.to_string(),
        },
    }
}
