use lumen_serde::{ByteWrite, ByteWriter, Serde, UnsignedVariableInteger};

use crate::{
    types::FrameNumber,
    world::{
        node::{diff_mask::DiffMask, node_kinds::TypeTag, replicate::Replicate},
        node_tree::NodeId,
    },
};

use super::{
    blob::{BlobKind, TERMINATOR},
    command::Command,
    input::InputEvent,
};

/// Composes one outbound frame in memory. Nothing reaches the transport until
/// `finish` hands over the complete bytes, so a frame is sent whole or not at
/// all.
pub struct FrameWriter {
    writer: ByteWriter,
    blob_count: usize,
    node_count: usize,
}

impl FrameWriter {
    /// A frame without a header blob
    pub fn new() -> Self {
        Self {
            writer: ByteWriter::new(),
            blob_count: 0,
            node_count: 0,
        }
    }

    /// A frame that opens with a header blob carrying `frame_number`
    pub fn with_header(frame_number: FrameNumber) -> Self {
        let mut frame = Self::new();
        let mut body = ByteWriter::with_capacity(5);
        frame_number.ser(&mut body);
        frame.write_blob(BlobKind::Header, body);
        frame
    }

    pub fn command(&mut self, command: &Command) {
        self.commands(std::slice::from_ref(command));
    }

    /// Writes several commands into a single command blob
    pub fn commands(&mut self, commands: &[Command]) {
        if commands.is_empty() {
            return;
        }
        let mut body = ByteWriter::new();
        for command in commands {
            command.write(&mut body);
        }
        self.write_blob(BlobKind::Command, body);
        self.blob_count += 1;
    }

    /// Writes the groups of `replica` selected by `mask`
    pub fn node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        tag: TypeTag,
        mask: &DiffMask,
        replica: &dyn Replicate,
    ) {
        let mut body = ByteWriter::new();
        id.ser(&mut body);
        parent.ser(&mut body);
        tag.ser(&mut body);
        mask.ser(&mut body);
        replica.write_groups(mask, &mut body);
        self.write_blob(BlobKind::Node, body);
        self.blob_count += 1;
        self.node_count += 1;
    }

    pub fn delete(&mut self, ids: &[NodeId]) {
        if ids.is_empty() {
            return;
        }
        let mut body = ByteWriter::with_capacity(ids.len() * 4 + 2);
        UnsignedVariableInteger::from(ids.len()).ser(&mut body);
        for id in ids {
            id.ser(&mut body);
        }
        self.write_blob(BlobKind::Delete, body);
        self.blob_count += 1;
    }

    pub fn input(&mut self, event: &InputEvent) {
        let mut body = ByteWriter::with_capacity(event.byte_length() + 1);
        event.ser(&mut body);
        self.write_blob(BlobKind::Input, body);
        self.blob_count += 1;
    }

    /// Blobs written so far, not counting the header
    pub fn blob_count(&self) -> usize {
        self.blob_count
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn is_empty(&self) -> bool {
        self.blob_count == 0
    }

    /// Closes the frame and returns its bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.writer.write_byte(TERMINATOR);
        self.writer.to_bytes()
    }

    // [kind][body length][body][terminator]
    fn write_blob(&mut self, kind: BlobKind, mut body: ByteWriter) {
        body.write_byte(TERMINATOR);
        self.writer.write_byte(kind.to_byte());
        UnsignedVariableInteger::from(body.len()).ser(&mut self.writer);
        self.writer.write_bytes(body.as_slice());
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}
