use thiserror::Error;

use lumen_serde::SerdeErr;

use super::blob::BlobKind;
use crate::world::node::node_kinds::TypeTag;

/// Errors that can occur while decoding a frame
///
/// SECURITY: all of these come from untrusted network data. None is fatal to
/// the process; at worst the rest of one frame is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The frame ended in the middle of a blob; decoding stops here and only
    /// the blobs before this point are used
    #[error("Frame truncated at byte {offset}")]
    Truncated { offset: usize },

    /// A blob's declared length is larger than any frame can be
    #[error("Blob at byte {offset} declares a length of {length} bytes, which no frame can hold")]
    BodyTooLong { offset: usize, length: u64 },

    /// A blob kind byte that matches no known kind
    #[error("Unknown blob kind {kind} at byte {offset}")]
    UnknownBlobKind { kind: u8, offset: usize },

    /// A node blob whose type tag is not in the registry. Usually means the
    /// two roles were built with different node kinds
    #[error("Unknown type tag {tag:?}. Both roles must register the same node kinds")]
    UnknownTypeTag { tag: TypeTag },

    /// A command opcode that matches no known command
    #[error("Unknown command opcode {opcode}")]
    UnknownOpcode { opcode: u8 },

    /// A blob body did not end exactly at its terminator byte
    #[error("{kind:?} blob is not terminated where its length says it ends")]
    MissingTerminator { kind: BlobKind },

    /// A header blob appeared after other blobs
    #[error("Header blob must be the first blob of a frame")]
    MisplacedHeader,

    /// A blob body held a value that could not be read
    #[error("Invalid {kind:?} blob: {error}")]
    InvalidBody { kind: BlobKind, error: SerdeErr },

    /// Reading a node's attribute groups failed
    #[error("Failed to read node attributes: {0}")]
    Serde(#[from] SerdeErr),
}

impl DecodeError {
    /// Whether this error ended decoding of the rest of the frame
    pub fn stops_decoding(&self) -> bool {
        matches!(
            self,
            DecodeError::Truncated { .. } | DecodeError::BodyTooLong { .. }
        )
    }
}
