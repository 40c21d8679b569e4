use std::{
    io,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc,
    },
    thread,
};

use log::{debug, error, info};

use crate::{
    client::DispatcherClient,
    config::DispatcherClientConfig,
    connection::DispatcherConnection,
    delegate::DispatcherClientDelegate,
    error::ConnectionError,
    slot::ConnectionSlot,
    transport::Transport,
};

/// Where the supervisor is in its connect / receive cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupervisorState {
    /// The slot is empty and no dial is in flight
    Disconnected,
    /// A dial is in flight
    Connecting,
    /// The slot holds a live connection
    Connected,
}

impl SupervisorState {
    fn to_u8(self) -> u8 {
        match self {
            SupervisorState::Disconnected => 0,
            SupervisorState::Connecting => 1,
            SupervisorState::Connected => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SupervisorState::Connecting,
            2 => SupervisorState::Connected,
            _ => SupervisorState::Disconnected,
        }
    }
}

/// Supervisor state readable from any thread
#[derive(Clone)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(SupervisorState::Disconnected.to_u8())))
    }

    pub fn get(&self) -> SupervisorState {
        SupervisorState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn set(&self, state: SupervisorState) {
        self.0.store(state.to_u8(), Ordering::Release);
    }
}

/// Keeps exactly one live dispatcher connection published in a
/// [`ConnectionSlot`], redialing forever after any failure.
///
/// There is no way to stop a started supervisor; it lives as long as the
/// process.
pub struct ConnectionSupervisor {
    config: DispatcherClientConfig,
    transport: Arc<dyn Transport>,
    delegate: Arc<dyn DispatcherClientDelegate>,
    slot: ConnectionSlot,
    state: StateCell,
}

impl ConnectionSupervisor {
    pub fn new<T: Transport + 'static>(
        config: DispatcherClientConfig,
        transport: T,
        delegate: Arc<dyn DispatcherClientDelegate>,
    ) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
            delegate,
            slot: ConnectionSlot::new(),
            state: StateCell::new(),
        }
    }

    pub fn slot(&self) -> &ConnectionSlot {
        &self.slot
    }

    pub fn state(&self) -> SupervisorState {
        self.state.get()
    }

    /// Handle for everything that needs to send through the dispatcher
    pub fn client(&self) -> DispatcherClient {
        DispatcherClient::new(self.slot.clone(), self.state.clone())
    }

    /// Blocks until the first connection is up, then moves the receive loop
    /// onto its own thread
    pub fn start(self) -> io::Result<DispatcherClient> {
        self.assure_connected();

        let client = self.client();
        thread::Builder::new()
            .name("dispatcher-recv".to_string())
            .spawn(move || {
                self.serve_forever();
            })?;
        Ok(client)
    }

    /// Returns the published connection, dialing (and redialing after a
    /// fixed delay) until one is up
    pub fn assure_connected(&self) -> Arc<DispatcherConnection> {
        loop {
            if let Some(connection) = self.slot.current() {
                return connection;
            }

            self.state.set(SupervisorState::Connecting);
            match self.connect() {
                Ok(connection) => {
                    self.slot.publish(connection.clone());
                    self.state.set(SupervisorState::Connected);
                    info!("dispatcher_client: connected to dispatcher: {}", connection);
                    self.delegate.on_dispatcher_connected();
                    return connection;
                }
                Err(err) => {
                    self.state.set(SupervisorState::Disconnected);
                    error!("Connect to dispatcher failed: {}", err);
                    thread::sleep(self.config.reconnect_delay);
                }
            }
        }
    }

    fn connect(&self) -> Result<Arc<DispatcherConnection>, ConnectionError> {
        let addr = self.config.addr();
        let link = self.transport.dial(&addr)?;
        Ok(Arc::new(DispatcherConnection::new(addr, link)))
    }

    /// Receives from the dispatcher forever, handing every message to the
    /// delegate in wire order
    pub fn serve_forever(&self) -> ! {
        debug!("serve_forever: start serving dispatcher client ...");
        loop {
            self.serve_next();
        }
    }

    fn serve_next(&self) {
        let connection = self.assure_connected();
        match connection.receive() {
            Ok((msg_type, packet)) => {
                debug!(
                    "{}: received msg type {}, payload {} bytes",
                    connection,
                    msg_type,
                    packet.payload().len()
                );
                self.delegate.handle_dispatcher_packet(msg_type, packet);
            }
            Err(err) => {
                error!("serve_forever: receive from {} failed: {}", connection, err);
                connection.close();
                self.slot.clear();
                self.state.set(SupervisorState::Disconnected);
                thread::sleep(self.config.reconnect_delay);
            }
        }
    }
}
