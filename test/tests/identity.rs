use lumen_client::{ClientConfig, ClientIdentity};
use lumen_server::ServerConfig;
use lumen_test::{client_config, protocol, Harness, Transform};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn persisted_identity_survives_a_restart() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let config = |seed| ClientConfig {
        identity: ClientIdentity::load_or_create(dir.path()).unwrap(),
        ..client_config(seed)
    };

    let mut harness = Harness::with_configs(ServerConfig::default(), vec![config(1)], protocol);
    let root = harness
        .server
        .insert(None, Transform::new(4.0, 2.0))
        .unwrap();
    harness.connect_all();
    let guid = harness.client(0).guid().to_string();
    let session_id = harness.client(0).session_id();

    harness.clients.clear();
    harness.add_client(config(2), protocol());
    harness.connect_all();

    assert_eq!(harness.client(0).guid().to_string(), guid);
    assert_eq!(harness.client(0).session_id(), session_id);
    assert_eq!(harness.server.roster().len(), 1);
    assert!(harness.client(0).tree().contains(root));
    assert!(dir.path().join(ClientIdentity::FILE_NAME).exists());
}

#[test]
fn separate_state_dirs_are_separate_displays() {
    init_logging();
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let configs = vec![
        ClientConfig {
            identity: ClientIdentity::load_or_create(first.path()).unwrap(),
            ..client_config(1)
        },
        ClientConfig {
            identity: ClientIdentity::load_or_create(second.path()).unwrap(),
            ..client_config(2)
        },
    ];

    let mut harness = Harness::with_configs(ServerConfig::default(), configs, protocol);
    harness.connect_all();

    assert_ne!(harness.client(0).guid(), harness.client(1).guid());
    assert_ne!(harness.client(0).session_id(), harness.client(1).session_id());
    assert_eq!(harness.server.roster().len(), 2);
}
