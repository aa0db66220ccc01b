use lumen_client::ClientState;
use lumen_server::ServerConfig;
use lumen_shared::{Protocol, ProtocolError, RegistryError, TypeTag};
use lumen_test::{client_config, protocol, reversed_protocol, Harness, Label, Transform, HANDSHAKE_TICKS};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn registration_order_does_not_matter() {
    init_logging();
    let forward = protocol();
    let reversed = reversed_protocol();

    for name in ["Transform", "Label"] {
        assert_eq!(
            forward.node_kinds.tag_for_name(name),
            reversed.node_kinds.tag_for_name(name)
        );
    }
    assert_eq!(
        forward.node_kinds.tag_for_name("Label"),
        Some(TypeTag::from_name("Label"))
    );
}

#[test]
fn display_with_reversed_registry_mirrors_the_tree() {
    init_logging();
    let mut harness = Harness::with_configs(ServerConfig::default(), Vec::new(), protocol);
    harness.add_client(client_config(3), reversed_protocol());

    let root = harness
        .server
        .insert(None, Transform::new(2.0, 3.0))
        .unwrap();
    let label = harness
        .server
        .insert(Some(root), Label::new("either way"))
        .unwrap();
    harness.connect_all();

    assert!(harness.mirrors_match(0));
    assert_eq!(
        harness.client(0).get::<Label>(label).unwrap().text,
        "either way"
    );
}

#[test]
fn display_missing_a_kind_skips_only_those_nodes() {
    init_logging();
    fn transforms_only() -> Protocol {
        Protocol::builder().add_kind::<Transform>().build()
    }

    let mut harness = Harness::with_configs(ServerConfig::default(), Vec::new(), protocol);
    harness.add_client(client_config(6), transforms_only());

    let root = harness
        .server
        .insert(None, Transform::new(0.0, 1.0))
        .unwrap();
    let label = harness
        .server
        .insert(Some(root), Label::new("unknown there"))
        .unwrap();
    assert!(harness.tick_until(HANDSHAKE_TICKS, |harness| {
        harness.client(0).tree().contains(root)
    }));
    harness.tick_n(3);

    let client = harness.client(0);
    assert!(client.tree().contains(root));
    assert!(!client.tree().contains(label));
    assert_eq!(client.state(), ClientState::Running);

    let events = harness.client_mut(0).take_events();
    assert!(events.updated_nodes().any(|id| id == root));
    assert!(!events.updated_nodes().any(|id| id == label));
}

#[test]
fn server_rejects_kinds_it_does_not_know() {
    init_logging();
    fn labels_only() -> Protocol {
        Protocol::builder().add_kind::<Label>().build()
    }
    let mut harness = Harness::with_configs(ServerConfig::default(), Vec::new(), labels_only);

    assert!(harness.server.insert(None, Transform::new(0.0, 0.0)).is_err());
    assert!(harness.server.insert(None, Label::new("fine")).is_ok());
}

#[test]
fn registering_a_kind_twice_is_reported() {
    let mut protocol = Protocol::builder();
    protocol.add_kind::<Label>();

    assert_eq!(
        protocol.try_add_kind::<Label>().err(),
        Some(ProtocolError::Registry(RegistryError::AlreadyRegistered {
            name: "Label"
        }))
    );
}

#[test]
fn endpoints_lock_their_protocol() {
    init_logging();
    let harness = Harness::new(1);

    assert_eq!(
        harness.server.protocol().try_check_lock(),
        Err(ProtocolError::AlreadyLocked)
    );
    assert!(harness.client(0).protocol().is_locked());
}
