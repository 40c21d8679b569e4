//! In-memory transport for supervisor testing
//! Scripts dial outcomes and feeds packets without network I/O

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, Sender},
        Arc, Mutex,
    },
    time::Instant,
};

use meridian_server::{
    transport::{DispatcherAddr, Link, Transport},
    ConnectionError, Packet,
};

enum DialScript {
    Refuse,
    Accept(LocalLink),
}

#[derive(Default)]
struct ScriptState {
    script: VecDeque<DialScript>,
    attempts: Vec<Instant>,
}

/// Transport whose dials succeed or fail in a scripted order. Once the
/// script runs out every dial is refused. Clones share the script.
#[derive(Clone, Default)]
pub struct LocalTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next dial fails
    pub fn refuse(&self) {
        self.state.lock().unwrap().script.push_back(DialScript::Refuse);
    }

    /// The next dial succeeds with a link driven by the returned controller
    pub fn accept(&self) -> LocalLinkController {
        let (controller, link) = LocalLink::pair();
        self.state
            .lock()
            .unwrap()
            .script
            .push_back(DialScript::Accept(link));
        controller
    }

    /// Times at which dials were attempted
    pub fn dial_attempts(&self) -> Vec<Instant> {
        self.state.lock().unwrap().attempts.clone()
    }
}

impl Transport for LocalTransport {
    fn dial(&self, addr: &DispatcherAddr) -> Result<Box<dyn Link>, ConnectionError> {
        let mut state = self.state.lock().unwrap();
        state.attempts.push(Instant::now());
        match state.script.pop_front() {
            Some(DialScript::Accept(link)) => Ok(Box::new(link)),
            Some(DialScript::Refuse) | None => Err(ConnectionError::Dial {
                addr: addr.to_string(),
                reason: "refused by script".to_string(),
            }),
        }
    }
}

type Inbound = Result<Packet, ConnectionError>;

/// Link end handed to the supervisor
pub struct LocalLink {
    inbound: Mutex<Receiver<Inbound>>,
    wakeup: Mutex<Sender<Inbound>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
}

/// Test-side end of a LocalLink
#[derive(Clone)]
pub struct LocalLinkController {
    inbound: Sender<Inbound>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
    closed: Arc<AtomicBool>,
}

impl LocalLink {
    pub fn pair() -> (LocalLinkController, LocalLink) {
        let (sender, receiver) = mpsc::channel();
        let written = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let controller = LocalLinkController {
            inbound: sender.clone(),
            written: written.clone(),
            closed: closed.clone(),
        };
        let link = LocalLink {
            inbound: Mutex::new(receiver),
            wakeup: Mutex::new(sender),
            written,
            closed,
        };
        (controller, link)
    }
}

impl Link for LocalLink {
    fn read_packet(&self) -> Result<Packet, ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }
        let inbound = self.inbound.lock().unwrap();
        match inbound.recv() {
            Ok(result) => result,
            Err(_) => Err(ConnectionError::Closed),
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }
        self.written.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let _ = self.wakeup.lock().unwrap().send(Err(ConnectionError::Closed));
    }
}

impl LocalLinkController {
    /// Queues a message for the receive loop
    pub fn push(&self, packet: Packet) {
        let _ = self.inbound.send(Ok(packet));
    }

    /// Makes the next receive fail
    pub fn fail(&self, error: ConnectionError) {
        let _ = self.inbound.send(Err(error));
    }

    /// Bytes written through the link so far
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
