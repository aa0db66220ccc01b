use crate::world::{
    node::{diff_mask::DiffMask, node_kinds::TypeTag},
    node_tree::NodeId,
};

use super::{command::Command, input::InputEvent};

/// Ends every blob body, and the frame itself. No blob kind or opcode uses it.
pub const TERMINATOR: u8 = 0;

/// The closed set of blob kinds a frame may carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlobKind {
    Header = 1,
    Command = 2,
    Node = 3,
    Delete = 4,
    Input = 5,
}

impl BlobKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(BlobKind::Header),
            2 => Some(BlobKind::Command),
            3 => Some(BlobKind::Node),
            4 => Some(BlobKind::Delete),
            5 => Some(BlobKind::Input),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Header and command blobs steer the handshake; the rest carry world data
    pub fn is_control(self) -> bool {
        matches!(self, BlobKind::Header | BlobKind::Command)
    }
}

/// One node's changed attribute groups, still encoded. The registry turns the
/// payload into attributes when the blob is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeBlob {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub tag: TypeTag,
    pub mask: DiffMask,
    pub payload: Vec<u8>,
}

/// A decoded blob, other than the header
#[derive(Clone, Debug, PartialEq)]
pub enum Blob {
    Command(Command),
    Node(NodeBlob),
    Delete(Vec<NodeId>),
    Input(InputEvent),
}

impl Blob {
    pub fn kind(&self) -> BlobKind {
        match self {
            Blob::Command(_) => BlobKind::Command,
            Blob::Node(_) => BlobKind::Node,
            Blob::Delete(_) => BlobKind::Delete,
            Blob::Input(_) => BlobKind::Input,
        }
    }
}
