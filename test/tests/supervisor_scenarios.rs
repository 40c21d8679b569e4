use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use meridian_server::{
    ConnectionError, ConnectionSupervisor, DispatcherClientConfig, Packet, SendError,
    SupervisorState,
};
use meridian_test::{wait_until, DelegateEvent, LocalTransport, RecordingDelegate};

const DELAY: Duration = Duration::from_millis(40);
const PATIENCE: Duration = Duration::from_secs(5);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config() -> DispatcherClientConfig {
    DispatcherClientConfig {
        reconnect_delay: DELAY,
        ..DispatcherClientConfig::default()
    }
}

fn supervisor(transport: &LocalTransport) -> (Arc<RecordingDelegate>, ConnectionSupervisor) {
    let delegate = Arc::new(RecordingDelegate::new());
    let supervisor = ConnectionSupervisor::new(config(), transport.clone(), delegate.clone());
    delegate.watch_slot(supervisor.slot().clone());
    (delegate, supervisor)
}

#[test]
fn start_retries_until_the_dispatcher_accepts() {
    init_logging();

    let transport = LocalTransport::new();
    transport.refuse();
    transport.refuse();
    let _link = transport.accept();
    let (delegate, supervisor) = supervisor(&transport);

    let started = Instant::now();
    let client = supervisor.start().unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= DELAY * 2, "start returned after {:?}", elapsed);
    assert!(client.is_connected());
    assert_eq!(client.state(), SupervisorState::Connected);

    let attempts = transport.dial_attempts();
    assert_eq!(attempts.len(), 3);
    for pair in attempts.windows(2) {
        assert!(pair[1] - pair[0] >= DELAY);
    }

    assert_eq!(delegate.connect_count(), 1);
    match &delegate.events()[0] {
        DelegateEvent::Connected { slot_published, .. } => assert!(*slot_published),
        other => panic!("unexpected first event {:?}", other),
    }
}

#[test]
fn connected_hook_runs_before_the_first_packet() {
    init_logging();

    let transport = LocalTransport::new();
    let link = transport.accept();
    link.push(Packet::new(7, b"early".to_vec()));
    let (delegate, supervisor) = supervisor(&transport);

    let _client = supervisor.start().unwrap();
    assert!(delegate.wait_for(PATIENCE, |events| events.len() == 2));

    let events = delegate.events();
    assert!(matches!(events[0], DelegateEvent::Connected { .. }));
    assert_eq!(
        events[1],
        DelegateEvent::Packet {
            msg_type: 7,
            payload: b"early".to_vec()
        }
    );
}

#[test]
fn broken_connection_is_replaced_and_delivery_resumes() {
    init_logging();

    let transport = LocalTransport::new();
    let first = transport.accept();
    transport.refuse();
    let second = transport.accept();
    let (delegate, supervisor) = supervisor(&transport);

    let client = supervisor.start().unwrap();
    let first_connection = client.connection_for_send().unwrap();

    first.push(Packet::new(1, b"A".to_vec()));
    assert!(delegate.wait_for(PATIENCE, |events| events.len() == 2));

    first.fail(ConnectionError::Read {
        reason: "connection reset by test".to_string(),
    });
    first.push(Packet::new(2, b"stale".to_vec()));

    assert!(wait_until(PATIENCE, || !client.is_connected()));
    assert_eq!(client.send(b"dropped"), Err(SendError::NotConnected));
    assert_eq!(delegate.connect_count(), 1);

    assert!(delegate.wait_for(PATIENCE, |events| {
        events
            .iter()
            .filter(|event| matches!(event, DelegateEvent::Connected { .. }))
            .count()
            == 2
    }));
    let second_connection = client.connection_for_send().unwrap();
    assert_ne!(first_connection.id(), second_connection.id());
    assert!(first_connection.is_closed());
    assert!(first.is_closed());

    second.push(Packet::new(3, b"C".to_vec()));
    assert!(delegate.wait_for(PATIENCE, |events| events.len() == 4));
    assert_eq!(
        delegate.packets(),
        vec![(1, b"A".to_vec()), (3, b"C".to_vec())]
    );
    assert_eq!(transport.dial_attempts().len(), 3);
}

#[test]
fn sends_go_through_the_current_connection() {
    init_logging();

    let transport = LocalTransport::new();
    let link = transport.accept();
    let (_delegate, supervisor) = supervisor(&transport);
    let client = supervisor.start().unwrap();

    client.send_packet(&Packet::new(5, vec![0xAA])).unwrap();
    client.send(&[1, 2, 3]).unwrap();

    assert_eq!(
        link.written(),
        vec![vec![3, 0, 0, 0, 5, 0, 0xAA], vec![1, 2, 3]]
    );
}

#[test]
fn wait_connected_returns_the_published_connection() {
    init_logging();

    let transport = LocalTransport::new();
    let _link = transport.accept();
    let (_delegate, supervisor) = supervisor(&transport);
    let client = supervisor.start().unwrap();

    let connection = client.wait_connected(Duration::from_millis(10)).unwrap();
    assert_eq!(connection.id(), client.connection_for_send().unwrap().id());
    assert_eq!(connection.addr().to_string(), "127.0.0.1:13000");
}
