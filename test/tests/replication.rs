use lumen_client::ClientEvent;
use lumen_server::ServerEvent;
use lumen_shared::{Blob, Command, InputEvent, InputPhase, NodeId, TreeError};
use lumen_test::{Harness, Label, Transform};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// root Transform with a Label and a second Transform beneath it
fn scene(harness: &mut Harness) -> (NodeId, NodeId, NodeId) {
    let root = harness
        .server
        .insert(None, Transform::new(0.0, 0.0))
        .unwrap();
    let label = harness
        .server
        .insert(Some(root), Label::new("hello"))
        .unwrap();
    let other = harness
        .server
        .insert(Some(root), Transform::new(5.0, 5.0))
        .unwrap();
    (root, label, other)
}

#[test]
fn world_reaches_the_mirror() {
    init_logging();
    let mut harness = Harness::new(1);
    let (root, label, other) = scene(&mut harness);
    harness.connect_all();

    assert!(harness.mirrors_match(0));
    let client = harness.client(0);
    assert_eq!(client.tree().len(), 3);
    assert_eq!(client.tree().parent(label), Some(root));
    assert_eq!(client.get::<Label>(label).unwrap().text, "hello");
    assert_eq!(client.get::<Transform>(other).unwrap().x, 5.0);
}

#[test]
fn one_mutation_sends_one_node_blob() {
    init_logging();
    let mut harness = Harness::new(1);
    let (_, label, _) = scene(&mut harness);
    harness.connect_all();

    harness
        .server
        .mutate::<Label, _>(label, |node| node.set_text("world"))
        .unwrap();
    harness.tick();

    let frames = harness.server_frames();
    assert_eq!(frames.len(), 1);
    let nodes: Vec<_> = frames[0].node_blobs().collect();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].id, label);
    assert_eq!(nodes[0].mask.groups().collect::<Vec<_>>(), vec![Label::TEXT]);

    assert_eq!(harness.client(0).get::<Label>(label).unwrap().text, "world");
    assert_eq!(harness.server.dirty_count(), 0);

    // nothing changed since, so nothing is sent
    harness.tick();
    let frames = harness.server_frames();
    assert_eq!(frames[0].node_blobs().count(), 0);
}

#[test]
fn rejected_mutation_changes_nothing() {
    init_logging();
    let mut harness = Harness::new(1);
    let (root, _, _) = scene(&mut harness);
    harness.connect_all();

    let result = harness
        .server
        .mutate::<Transform, _>(root, |node| node.move_to(5.0, 5.0).with(9));
    assert!(matches!(
        result,
        Err(TreeError::GroupOutOfRange { group: 9, .. })
    ));
    assert_eq!(harness.server.dirty_count(), 0);
    assert_eq!(harness.server.tree().get_as::<Transform>(root).unwrap().x, 0.0);

    harness.tick();
    assert_eq!(harness.server_frames()[0].node_blobs().count(), 0);
    assert!(harness.mirrors_match(0));
}

#[test]
fn delete_sends_one_delete_blob() {
    init_logging();
    let mut harness = Harness::new(1);
    let (root, label, other) = scene(&mut harness);
    harness.connect_all();

    harness.server.delete(other).unwrap();
    harness.tick();

    let frames = harness.server_frames();
    assert_eq!(frames.len(), 1);
    let deletes: Vec<_> = frames[0]
        .blobs
        .iter()
        .filter_map(|blob| match blob {
            Blob::Delete(ids) => Some(ids.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(deletes, vec![vec![other]]);

    let client = harness.client(0);
    assert_eq!(client.tree().len(), 2);
    assert!(client.tree().contains(root));
    assert!(client.tree().contains(label));
    assert!(!client.tree().contains(other));
}

#[test]
fn deleting_a_parent_removes_the_subtree_everywhere() {
    init_logging();
    let mut harness = Harness::new(1);
    let (root, label, other) = scene(&mut harness);
    harness.connect_all();

    let removed = harness.server.delete(root).unwrap();
    assert_eq!(removed.len(), 3);
    harness.tick();

    assert!(harness.client(0).tree().is_empty());
    let mut deleted: Vec<_> = harness.client_mut(0).take_events().deleted_nodes().collect();
    deleted.sort();
    assert_eq!(deleted, vec![root, label, other]);
}

#[test]
fn full_resync_sends_each_node_once() {
    init_logging();
    let mut harness = Harness::new(1);
    let (root, label, other) = scene(&mut harness);
    harness.connect_all();

    harness.server.request_full_sync();
    harness.tick();

    let frames = harness.server_frames();
    assert_eq!(frames.len(), 1);
    let frame = &frames[0];
    assert_eq!(frame.frame_number, Some(-1));
    assert!(frame.commands().any(|command| *command == Command::SendWorld));

    let ids: Vec<NodeId> = frame.node_blobs().map(|node| node.id).collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], root);
    assert!(ids.contains(&label));
    assert!(ids.contains(&other));

    let events = harness.client_mut(0).take_events();
    assert!(events.contains(&ClientEvent::WorldCleared));
    assert_eq!(events.updated_nodes().count(), 3);
    assert!(harness.mirrors_match(0));
}

#[test]
fn dirty_changes_converge() {
    init_logging();
    let mut harness = Harness::new(2);
    let (root, label, other) = scene(&mut harness);
    harness.connect_all();

    for step in 0..20 {
        let value = step as f32;
        harness
            .server
            .mutate::<Transform, _>(root, |node| node.move_to(value, -value))
            .unwrap();
        if step % 3 == 0 {
            harness
                .server
                .mutate::<Transform, _>(other, |node| node.rotate(value * 0.5))
                .unwrap();
        }
        if step % 4 == 0 {
            harness.server.mark_dirty(label, Label::COLOR).unwrap();
        }
        harness.tick();
    }

    for index in 0..2 {
        let client = harness.client(index);
        assert_eq!(
            client.get::<Transform>(root),
            harness.server.tree().get_as::<Transform>(root)
        );
        assert_eq!(
            client.get::<Transform>(other),
            harness.server.tree().get_as::<Transform>(other)
        );
        assert_eq!(client.get::<Transform>(root).unwrap().x, 19.0);
    }
}

#[test]
fn nodes_inserted_while_running_arrive() {
    init_logging();
    let mut harness = Harness::new(1);
    let (root, _, _) = scene(&mut harness);
    harness.connect_all();

    let late = harness
        .server
        .insert(Some(root), Label::new("late"))
        .unwrap();
    harness.tick();

    assert_eq!(harness.client(0).get::<Label>(late).unwrap().text, "late");
    assert_eq!(harness.client(0).tree().parent(late), Some(root));
}

#[test]
fn display_changes_reach_the_server_and_other_displays() {
    init_logging();
    let mut harness = Harness::new(2);
    let (root, _, _) = scene(&mut harness);
    harness.connect_all();

    harness
        .client_mut(0)
        .mutate::<Transform, _>(root, |node| node.rotate(1.5))
        .unwrap();
    harness.tick_n(3);

    assert_eq!(
        harness.server.tree().get_as::<Transform>(root).unwrap().rotation,
        1.5
    );
    assert_eq!(harness.client(1).get::<Transform>(root).unwrap().rotation, 1.5);
}

#[test]
fn input_reaches_the_server_with_its_session() {
    init_logging();
    let mut harness = Harness::new(1);
    scene(&mut harness);
    harness.connect_all();

    let session_id = harness.client(0).session_id();
    harness
        .client_mut(0)
        .send_input(InputEvent::mouse(InputPhase::Began, 120.0, 48.0));
    harness
        .client_mut(0)
        .send_input(InputEvent::new(InputPhase::Ended, 3, 121.0, 50.0));
    harness.tick_n(2);

    let events = harness.server.take_events();
    let inputs: Vec<_> = events.inputs().collect();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].0, Some(session_id));
    assert_eq!(inputs[0].1.touch_id, InputEvent::MOUSE_ID);
    assert_eq!(inputs[1].1.phase, InputPhase::Ended);
    assert!(!events
        .iter()
        .any(|event| matches!(event, ServerEvent::WorldSent { .. })));
}

#[test]
fn every_display_mirrors_the_same_tree() {
    init_logging();
    let mut harness = Harness::new(3);
    scene(&mut harness);
    harness.connect_all();

    for index in 0..3 {
        assert!(harness.mirrors_match(index), "display {}", index);
    }
}

#[test]
fn traffic_is_counted() {
    init_logging();
    let mut harness = Harness::new(1);
    scene(&mut harness);
    harness.connect_all();
    harness.server.take_bytes_sent();
    harness.server.take_bytes_received();

    harness.tick_n(2);

    assert!(harness.server.take_bytes_sent() > 0);
    assert!(harness.server.take_bytes_received() > 0);
    assert!(harness.client_mut(0).take_bytes_received() > 0);
    assert_eq!(harness.server.take_bytes_sent(), 0);
}
