use log::warn;

use lumen_serde::{ByteReader, Serde, SerdeErr, UnsignedVariableInteger};

use crate::{
    constants::MAX_FRAME_BYTES,
    types::FrameNumber,
    world::{
        node::{diff_mask::DiffMask, node_kinds::{NodeKinds, TypeTag}},
        node_tree::NodeId,
    },
};

use super::{
    blob::{Blob, BlobKind, NodeBlob, TERMINATOR},
    command::Command,
    error::DecodeError,
    input::InputEvent,
};

/// Which blobs a reader decodes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// Every blob
    Full,
    /// Header and command blobs only; world data is skipped unread. Used by a
    /// client that is still in the handshake.
    ControlOnly,
}

/// Everything recovered from one frame
#[derive(Debug, Default)]
pub struct DecodedFrame {
    pub frame_number: Option<FrameNumber>,
    pub blobs: Vec<Blob>,
    pub errors: Vec<DecodeError>,
}

impl DecodedFrame {
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.blobs.iter().filter_map(|blob| match blob {
            Blob::Command(command) => Some(command),
            _ => None,
        })
    }

    pub fn node_blobs(&self) -> impl Iterator<Item = &NodeBlob> {
        self.blobs.iter().filter_map(|blob| match blob {
            Blob::Node(node) => Some(node),
            _ => None,
        })
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Splits inbound frames back into blobs. A damaged blob costs only itself:
/// its length prefix lets decoding resume at the next blob. Only a frame that
/// is cut short ends decoding early.
pub struct FrameReader<'k> {
    kinds: &'k NodeKinds,
}

impl<'k> FrameReader<'k> {
    pub fn new(kinds: &'k NodeKinds) -> Self {
        Self { kinds }
    }

    pub fn read(&self, bytes: &[u8]) -> DecodedFrame {
        self.read_with(bytes, ReadMode::Full)
    }

    pub fn read_with(&self, bytes: &[u8], mode: ReadMode) -> DecodedFrame {
        let mut output = DecodedFrame::default();
        let mut reader = ByteReader::new(bytes);
        let mut first = true;

        loop {
            let offset = reader.position();
            let Ok(kind_byte) = reader.read_byte() else {
                // the closing terminator never arrived
                output.errors.push(DecodeError::Truncated { offset });
                break;
            };
            if kind_byte == TERMINATOR {
                if !reader.is_empty() {
                    warn!("{} bytes after the end of frame ignored", reader.remaining());
                }
                break;
            }

            let body_length = match UnsignedVariableInteger::de_length(&mut reader, MAX_FRAME_BYTES) {
                Ok(length) => length,
                Err(SerdeErr::LengthOverflow { length, .. }) => {
                    output.errors.push(DecodeError::BodyTooLong { offset, length });
                    break;
                }
                Err(_) => {
                    output.errors.push(DecodeError::Truncated { offset });
                    break;
                }
            };
            let Ok(mut body) = reader.sub_reader(body_length) else {
                output.errors.push(DecodeError::Truncated { offset });
                break;
            };

            let is_first = first;
            first = false;

            let Some(kind) = BlobKind::from_byte(kind_byte) else {
                output.errors.push(DecodeError::UnknownBlobKind {
                    kind: kind_byte,
                    offset,
                });
                continue;
            };
            if mode == ReadMode::ControlOnly && !kind.is_control() {
                continue;
            }

            let result = match kind {
                BlobKind::Header => {
                    if !is_first {
                        Err(DecodeError::MisplacedHeader)
                    } else {
                        Self::read_header(&mut body).map(|frame_number| {
                            output.frame_number = Some(frame_number);
                        })
                    }
                }
                BlobKind::Command => Self::read_commands(&mut body).map(|commands| {
                    output.blobs.extend(commands.into_iter().map(Blob::Command));
                }),
                BlobKind::Node => self.read_node(&mut body).map(|node| {
                    output.blobs.push(Blob::Node(node));
                }),
                BlobKind::Delete => Self::read_delete(&mut body).map(|ids| {
                    output.blobs.push(Blob::Delete(ids));
                }),
                BlobKind::Input => Self::read_input(&mut body).map(|event| {
                    output.blobs.push(Blob::Input(event));
                }),
            };
            if let Err(error) = result {
                output.errors.push(error);
            }
        }

        output
    }

    fn read_header(body: &mut ByteReader) -> Result<FrameNumber, DecodeError> {
        let frame_number = FrameNumber::de(body).map_err(|error| DecodeError::InvalidBody {
            kind: BlobKind::Header,
            error,
        })?;
        Self::expect_terminator(body, BlobKind::Header)?;
        Ok(frame_number)
    }

    fn read_commands(body: &mut ByteReader) -> Result<Vec<Command>, DecodeError> {
        let mut commands = Vec::new();
        loop {
            let opcode = body.read_byte().map_err(|_| DecodeError::MissingTerminator {
                kind: BlobKind::Command,
            })?;
            if opcode == TERMINATOR {
                break;
            }
            commands.push(Command::read(opcode, body)?);
        }
        if !body.is_empty() {
            return Err(DecodeError::MissingTerminator {
                kind: BlobKind::Command,
            });
        }
        Ok(commands)
    }

    fn read_node(&self, body: &mut ByteReader) -> Result<NodeBlob, DecodeError> {
        let invalid = |error| DecodeError::InvalidBody {
            kind: BlobKind::Node,
            error,
        };
        let id = NodeId::de(body).map_err(invalid)?;
        let parent = Option::<NodeId>::de(body).map_err(invalid)?;
        let tag = TypeTag::de(body).map_err(invalid)?;
        if !self.kinds.contains(tag) {
            return Err(DecodeError::UnknownTypeTag { tag });
        }
        let mask = DiffMask::de(body).map_err(invalid)?;

        // the groups run up to the terminator that closes the body
        let rest = body.read_bytes(body.remaining()).map_err(invalid)?;
        match rest.split_last() {
            Some((&TERMINATOR, payload)) => Ok(NodeBlob {
                id,
                parent,
                tag,
                mask,
                payload: payload.to_vec(),
            }),
            _ => Err(DecodeError::MissingTerminator {
                kind: BlobKind::Node,
            }),
        }
    }

    fn read_delete(body: &mut ByteReader) -> Result<Vec<NodeId>, DecodeError> {
        let invalid = |error| DecodeError::InvalidBody {
            kind: BlobKind::Delete,
            error,
        };
        // each id takes 4 bytes, which bounds the count before allocating
        let max_count = body.remaining() / 4;
        let count = UnsignedVariableInteger::de_length(body, max_count).map_err(invalid)?;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(NodeId::de(body).map_err(invalid)?);
        }
        Self::expect_terminator(body, BlobKind::Delete)?;
        Ok(ids)
    }

    fn read_input(body: &mut ByteReader) -> Result<InputEvent, DecodeError> {
        let event = InputEvent::de(body).map_err(|error| DecodeError::InvalidBody {
            kind: BlobKind::Input,
            error,
        })?;
        Self::expect_terminator(body, BlobKind::Input)?;
        Ok(event)
    }

    fn expect_terminator(body: &mut ByteReader, kind: BlobKind) -> Result<(), DecodeError> {
        match body.read_byte() {
            Ok(TERMINATOR) if body.is_empty() => Ok(()),
            _ => Err(DecodeError::MissingTerminator { kind }),
        }
    }
}
