use std::{net::SocketAddr, thread, time::Duration};

use lumen_client::{ClientConfig, ClientEvent, ClientState};
use lumen_server::{ServerConfig, ServerEvent, ServerState};
use lumen_shared::{
    Command, ConnectionConfig, DiffMask, FrameWriter, PacketChunker, MAX_FRAME_BYTES,
};
use lumen_test::{client_config, protocol, Harness, Label, Transform, HANDSHAKE_TICKS};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn quick_timeout() -> ConnectionConfig {
    ConnectionConfig {
        disconnection_timeout: Duration::from_millis(100),
        ..Default::default()
    }
}

#[test]
fn silence_renews_both_ends_and_they_resync() {
    init_logging();
    let server_config = ServerConfig {
        connection: quick_timeout(),
        ..Default::default()
    };
    let config = ClientConfig {
        connection: quick_timeout(),
        ..client_config(4)
    };
    let mut harness = Harness::with_configs(server_config, vec![config], protocol);
    let root = harness
        .server
        .insert(None, Transform::new(1.0, 1.0))
        .unwrap();
    harness.connect_all();
    let session_id = harness.client(0).session_id();
    assert_eq!(harness.hub.server_opens(), 1);
    assert_eq!(harness.hub.client_opens(0), 1);

    harness.hub.set_dropping(true);
    // changes made while the link is down arrive with the resync
    harness
        .server
        .mutate::<Transform, _>(root, |node| node.move_to(8.0, 9.0))
        .unwrap();
    harness.tick();
    thread::sleep(Duration::from_millis(250));
    harness.tick();

    assert_eq!(harness.hub.server_opens(), 2);
    assert_eq!(harness.hub.client_opens(0), 2);
    assert!(harness
        .server
        .take_events()
        .iter()
        .any(|event| *event == ServerEvent::ConnectionRenewed));
    let client_events = harness.client_mut(0).take_events();
    assert!(client_events.contains(&ClientEvent::ConnectionLost));
    assert_eq!(harness.client(0).state(), ClientState::ClientStarted);
    // the stale mirror stays until the next world arrives
    assert_eq!(harness.client(0).tree().len(), 1);
    assert_eq!(harness.client(0).get::<Transform>(root).unwrap().x, 1.0);

    harness.hub.set_dropping(false);
    assert!(harness.tick_until(HANDSHAKE_TICKS, Harness::all_running));

    assert_eq!(harness.client(0).session_id(), session_id);
    assert_eq!(harness.client(0).get::<Transform>(root).unwrap().x, 8.0);
    assert!(harness.mirrors_match(0));
}

#[test]
fn server_alone_does_not_renew() {
    init_logging();
    let server_config = ServerConfig {
        connection: quick_timeout(),
        ..Default::default()
    };
    let mut harness = Harness::with_configs(server_config, Vec::new(), protocol);
    harness.tick();
    thread::sleep(Duration::from_millis(250));
    harness.tick_n(3);

    assert_eq!(harness.hub.server_opens(), 1);
    assert_eq!(harness.server.state(), ServerState::Running);
}

#[test]
fn lagging_display_is_reported_then_recovers() {
    init_logging();
    let server_config = ServerConfig {
        disconnection_lag: 5,
        ..Default::default()
    };
    let mut harness = Harness::with_configs(
        server_config,
        vec![client_config(1), client_config(2)],
        protocol,
    );
    harness.connect_all();
    let slow_session = harness.client(1).session_id();

    // the second display stops taking its turn
    for _ in 0..10 {
        harness.server.update();
        harness.clients[0].update();
    }
    let events = harness.server.take_events();
    let lagging: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::ClientLagging { session_id, lag, .. } => Some((*session_id, *lag)),
            _ => None,
        })
        .collect();
    assert_eq!(lagging.len(), 1);
    assert_eq!(lagging[0].0, slow_session);
    assert!(lagging[0].1 > 5);
    assert!(harness.server.roster().get(slow_session).unwrap().lagging);

    harness.tick_n(3);
    let events = harness.server.take_events();
    assert!(events.iter().any(|event| matches!(
        event,
        ServerEvent::ClientRecovered { session_id, .. } if *session_id == slow_session
    )));
    assert!(!harness.server.roster().get(slow_session).unwrap().lagging);
}

#[test]
fn corrupt_inbound_frame_forces_a_resync() {
    init_logging();
    let mut harness = Harness::new(1);
    let label = harness.server.insert(None, Label::new("kept")).unwrap();
    harness.connect_all();

    // a heartbeat cut off halfway through its command blob
    let mut frame = FrameWriter::new();
    frame.command(&Command::ClientRunning {
        session_id: 1,
        frame: 0,
    });
    let bytes = frame.finish();
    let truncated = &bytes[..bytes.len() - 4];
    let mut chunker = PacketChunker::new(1400, MAX_FRAME_BYTES);
    let from: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    for datagram in chunker.chunk(truncated).unwrap() {
        harness.hub.inject_to_server(from, datagram);
    }

    harness.tick();
    assert_eq!(harness.server.state(), ServerState::SendWorld);
    harness.tick();

    let events = harness.server.take_events();
    assert!(events
        .iter()
        .any(|event| matches!(event, ServerEvent::WorldSent { node_count: 1 })));
    assert_eq!(harness.client(0).state(), ClientState::Running);
    assert_eq!(harness.client(0).get::<Label>(label).unwrap().text, "kept");
}

#[test]
fn garbage_datagrams_are_dropped() {
    init_logging();
    let mut harness = Harness::new(1);
    harness.server.insert(None, Label::new("still here")).unwrap();
    harness.connect_all();

    harness.hub.inject_to_clients(vec![1, 2, 3]);
    harness.hub.inject_to_server(
        "127.0.0.1:40001".parse().unwrap(),
        vec![0xFF; 40],
    );
    harness.tick_n(3);

    assert!(harness.all_running());
    assert!(harness.mirrors_match(0));
}

#[test]
fn node_data_from_displays_without_a_session_is_ignored() {
    init_logging();
    let mut harness = Harness::new(1);
    let root = harness
        .server
        .insert(None, Transform::new(1.0, 1.0))
        .unwrap();
    harness.connect_all();
    let tag = harness.server.node_kinds().tag_of::<Transform>().unwrap();

    let stranger = Transform::new(50.0, 60.0);
    let mut unannounced = FrameWriter::new();
    unannounced.node(root, None, tag, &DiffMask::full(3), &stranger);
    let mut unknown_session = FrameWriter::new();
    unknown_session.command(&Command::ClientRunning {
        session_id: 42,
        frame: 0,
    });
    unknown_session.node(root, None, tag, &DiffMask::full(3), &stranger);

    for (port, frame) in [(40002, unannounced), (40003, unknown_session)] {
        let from: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
        let mut chunker = PacketChunker::new(1400, MAX_FRAME_BYTES);
        for datagram in chunker.chunk(&frame.finish()).unwrap() {
            harness.hub.inject_to_server(from, datagram);
        }
    }
    harness.tick_n(2);

    assert_eq!(harness.server.state(), ServerState::Running);
    assert_eq!(harness.server.tree().get_as::<Transform>(root).unwrap().x, 1.0);
    assert_eq!(harness.client(0).get::<Transform>(root).unwrap().x, 1.0);
    assert_eq!(harness.server.dirty_count(), 0);
}
