use proptest::prelude::*;

use lumen_shared::{
    Blob, ByteReader, ByteWriter, DiffMask, FrameReader, FrameWriter, HostType, InputEvent,
    InputPhase, NodeId, NodeTree, PacketChunker, PacketDechunker, Serde, UnsignedVariableInteger,
    WorldReader, MAX_FRAME_BYTES, MAX_PARTIAL_GROUPS,
};
use lumen_test::{protocol, Label, Transform};

fn finite() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn transform() -> impl Strategy<Value = Transform> {
    (finite(), finite(), finite(), finite()).prop_map(|(x, y, rotation, scale)| Transform {
        x,
        y,
        rotation,
        scale,
    })
}

fn label() -> impl Strategy<Value = Label> {
    ("[ -~]{0,64}", any::<u32>()).prop_map(|(text, color)| Label { text, color })
}

// Writes a value, checks its declared length, and reads it back expecting
// every byte to be consumed
fn round_trip<T: Serde>(value: &T) -> T {
    let mut writer = ByteWriter::new();
    value.ser(&mut writer);
    let bytes = writer.to_bytes();
    assert_eq!(bytes.len(), value.byte_length());

    let mut reader = ByteReader::new(&bytes);
    let output = T::de(&mut reader).unwrap();
    assert!(reader.is_empty());
    output
}

#[test]
fn varint_boundaries() {
    for (value, length) in [
        (0u64, 1usize),
        (127, 1),
        (128, 2),
        (16_383, 2),
        (16_384, 3),
        (u64::from(u32::MAX), 5),
        (u64::MAX, 10),
    ] {
        let varint = UnsignedVariableInteger::new(value);
        assert_eq!(varint.byte_length(), length, "{}", value);
        assert_eq!(round_trip(&varint).get(), value);
    }
}

#[test]
fn float_edge_values_keep_their_bits() {
    for value in [0.0f64, -0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, f64::MIN_POSITIVE] {
        assert_eq!(round_trip(&value).to_bits(), value.to_bits());
    }
    for value in [-0.0f32, f32::NAN, f32::MAX] {
        assert_eq!(round_trip(&value).to_bits(), value.to_bits());
    }
}

proptest! {
    #[test]
    fn unsigned_integers_round_trip(a in any::<u8>(), b in any::<u16>(), c in any::<u32>(), d in any::<u64>()) {
        prop_assert_eq!(round_trip(&a), a);
        prop_assert_eq!(round_trip(&b), b);
        prop_assert_eq!(round_trip(&c), c);
        prop_assert_eq!(round_trip(&d), d);
    }

    #[test]
    fn signed_integers_round_trip(a in any::<i8>(), b in any::<i16>(), c in any::<i32>(), d in any::<i64>()) {
        prop_assert_eq!(round_trip(&a), a);
        prop_assert_eq!(round_trip(&b), b);
        prop_assert_eq!(round_trip(&c), c);
        prop_assert_eq!(round_trip(&d), d);
    }

    #[test]
    fn floats_round_trip_bit_for_bit(single in any::<u32>(), double in any::<u64>()) {
        let single = f32::from_bits(single);
        let double = f64::from_bits(double);
        prop_assert_eq!(round_trip(&single).to_bits(), single.to_bits());
        prop_assert_eq!(round_trip(&double).to_bits(), double.to_bits());
    }

    #[test]
    fn varints_round_trip(value in any::<u64>()) {
        prop_assert_eq!(round_trip(&UnsignedVariableInteger::new(value)).get(), value);
    }

    #[test]
    fn strings_and_sequences_round_trip(
        text in any::<String>(),
        values in prop::collection::vec(any::<u32>(), 0..200),
        maybe in prop::option::of(any::<String>()),
        flag in any::<bool>(),
    ) {
        prop_assert_eq!(round_trip(&text), text);
        prop_assert_eq!(round_trip(&values), values);
        prop_assert_eq!(round_trip(&maybe), maybe);
        prop_assert_eq!(round_trip(&flag), flag);
    }

    #[test]
    fn node_values_survive_the_frame(
        frame_number in any::<i32>(),
        transform in transform(),
        label in label(),
    ) {
        let protocol = protocol();
        let kinds = &protocol.node_kinds;
        let transform_tag = kinds.tag_of::<Transform>().unwrap();
        let label_tag = kinds.tag_of::<Label>().unwrap();
        let parent = NodeId::new(1);
        let child = NodeId::new(2);

        let mut writer = FrameWriter::with_header(frame_number);
        writer.node(parent, None, transform_tag, &DiffMask::full(3), &transform);
        writer.node(child, Some(parent), label_tag, &DiffMask::full(2), &label);
        let bytes = writer.finish();

        let frame = FrameReader::new(kinds).read(&bytes);
        prop_assert!(!frame.has_errors());
        prop_assert_eq!(frame.frame_number, Some(frame_number));

        let mut tree = NodeTree::new(HostType::Client);
        for blob in frame.node_blobs() {
            WorldReader::apply(&mut tree, kinds, blob).unwrap();
        }
        prop_assert_eq!(tree.get_as::<Transform>(parent), Some(&transform));
        prop_assert_eq!(tree.get_as::<Label>(child), Some(&label));
        prop_assert_eq!(tree.parent(child), Some(parent));
    }

    #[test]
    fn partial_masks_leave_other_groups_alone(
        before in transform(),
        after in transform(),
        groups in prop::collection::vec(any::<bool>(), 3),
    ) {
        let protocol = protocol();
        let kinds = &protocol.node_kinds;
        let tag = kinds.tag_of::<Transform>().unwrap();
        let id = NodeId::new(7);

        let mut writer = FrameWriter::new();
        writer.node(id, None, tag, &DiffMask::full(3), &before);
        let mut mask = DiffMask::new(3);
        for (group, set) in groups.iter().enumerate() {
            mask.set_bit(group as u8, *set);
        }
        writer.node(id, None, tag, &mask, &after);
        let bytes = writer.finish();

        let mut tree = NodeTree::new(HostType::Client);
        for blob in FrameReader::new(kinds).read(&bytes).node_blobs() {
            WorldReader::apply(&mut tree, kinds, blob).unwrap();
        }
        let node = tree.get_as::<Transform>(id).unwrap();
        let position = if groups[0] { &after } else { &before };
        prop_assert_eq!((node.x, node.y), (position.x, position.y));
        let rotation = if groups[1] { after.rotation } else { before.rotation };
        prop_assert_eq!(node.rotation, rotation);
        let scale = if groups[2] { after.scale } else { before.scale };
        prop_assert_eq!(node.scale, scale);
    }

    #[test]
    fn deletes_and_inputs_keep_their_order(
        ids in prop::collection::vec(1u32..10_000, 1..40),
        x in finite(),
        y in finite(),
    ) {
        let protocol = protocol();
        let ids: Vec<NodeId> = ids.into_iter().map(NodeId::new).collect();
        let input = InputEvent::new(InputPhase::Moved, 4, x, y);

        let mut writer = FrameWriter::new();
        writer.delete(&ids);
        writer.input(&input);
        let frame = FrameReader::new(&protocol.node_kinds).read(&writer.finish());

        prop_assert!(!frame.has_errors());
        prop_assert_eq!(frame.blobs, vec![Blob::Delete(ids), Blob::Input(input)]);
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let protocol = protocol();
        let frame = FrameReader::new(&protocol.node_kinds).read(&bytes);
        let mut tree = NodeTree::new(HostType::Client);
        for blob in frame.node_blobs() {
            let _ = WorldReader::apply(&mut tree, &protocol.node_kinds, blob);
        }
    }

    #[test]
    fn chunked_frames_reassemble(
        frames in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..3000), 1..6),
        chunk_size in 1usize..1500,
        rotation in any::<usize>(),
    ) {
        let mut chunker = PacketChunker::new(chunk_size, MAX_FRAME_BYTES);
        let mut dechunker = PacketDechunker::new(MAX_FRAME_BYTES, MAX_PARTIAL_GROUPS);

        for frame in &frames {
            let mut datagrams = chunker.chunk(frame).unwrap();
            // chunks of one frame may arrive in any order
            let len = datagrams.len();
            datagrams.rotate_left(rotation % len);

            let mut output = Vec::new();
            for datagram in &datagrams {
                if let Some(frame) = dechunker.receive(datagram).unwrap() {
                    output.push(frame);
                }
            }
            prop_assert_eq!(output, vec![frame.clone()]);
        }
        prop_assert_eq!(dechunker.partial_count(), 0);
    }
}
