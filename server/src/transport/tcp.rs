use std::{
    io::{BufReader, Write},
    net::{Shutdown, TcpStream},
    sync::Mutex,
};

use log::{debug, warn};

use super::{DispatcherAddr, Link, Transport};
use crate::{
    error::ConnectionError,
    packet::{write_error, Packet},
};

/// Dials the dispatcher over plain TCP
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for TcpTransport {
    fn dial(&self, addr: &DispatcherAddr) -> Result<Box<dyn Link>, ConnectionError> {
        let dial_error = |error: std::io::Error| ConnectionError::Dial {
            addr: addr.to_string(),
            reason: error.to_string(),
        };

        let stream = TcpStream::connect((addr.host.as_str(), addr.port)).map_err(dial_error)?;
        if let Err(error) = stream.set_nodelay(true) {
            warn!("TcpTransport: could not set TCP_NODELAY for {}: {}", addr, error);
        }
        debug!("TcpTransport: connected to {}", addr);

        let link = TcpLink::new(stream).map_err(dial_error)?;
        Ok(Box::new(link))
    }
}

/// A TCP stream split into independently locked read and write halves
pub struct TcpLink {
    reader: Mutex<BufReader<TcpStream>>,
    writer: Mutex<TcpStream>,
    control: TcpStream,
}

impl TcpLink {
    pub fn new(stream: TcpStream) -> std::io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        let control = stream.try_clone()?;
        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(stream),
            control,
        })
    }
}

impl Link for TcpLink {
    fn read_packet(&self) -> Result<Packet, ConnectionError> {
        let Ok(mut reader) = self.reader.lock() else {
            return Err(ConnectionError::Closed);
        };
        Packet::read_from(&mut *reader)
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let Ok(mut writer) = self.writer.lock() else {
            return Err(ConnectionError::Closed);
        };
        writer
            .write_all(bytes)
            .and_then(|_| writer.flush())
            .map_err(|error| write_error(bytes.len(), error))
    }

    fn close(&self) {
        if let Err(error) = self.control.shutdown(Shutdown::Both) {
            debug!("TcpLink: shutdown: {}", error);
        }
    }
}
