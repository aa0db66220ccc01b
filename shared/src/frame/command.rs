use lumen_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

use crate::types::{FrameNumber, SessionId};

use super::{blob::BlobKind, error::DecodeError};

/// Command opcodes. None of them may equal the terminator byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    ClientStarted = 1,
    RequestWorld = 2,
    ClientRunning = 3,
    SendWorld = 4,
    ClientStartedReply = 5,
}

impl Opcode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Opcode::ClientStarted),
            2 => Some(Opcode::RequestWorld),
            3 => Some(Opcode::ClientRunning),
            4 => Some(Opcode::SendWorld),
            5 => Some(Opcode::ClientStartedReply),
            _ => None,
        }
    }
}

/// How a display root projects its subtree
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RootKind {
    Ortho,
    Perspective,
}

impl Serde for RootKind {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let byte: u8 = match self {
            RootKind::Ortho => 0,
            RootKind::Perspective => 1,
        };
        byte.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match u8::de(reader)? {
            0 => Ok(RootKind::Ortho),
            1 => Ok(RootKind::Perspective),
            _ => Err(SerdeErr::InvalidValue {
                type_name: "RootKind",
            }),
        }
    }

    fn byte_length(&self) -> usize {
        1
    }
}

/// One of the server's output roots, which a client recreates locally
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RootDescriptor {
    pub root_id: i32,
    pub kind: RootKind,
}

impl RootDescriptor {
    pub fn new(root_id: i32, kind: RootKind) -> Self {
        Self { root_id, kind }
    }
}

impl Serde for RootDescriptor {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.root_id.ser(writer);
        self.kind.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let root_id = i32::de(reader)?;
        let kind = RootKind::de(reader)?;
        Ok(Self { root_id, kind })
    }

    fn byte_length(&self) -> usize {
        self.root_id.byte_length() + self.kind.byte_length()
    }
}

/// The server's answer to a client announcing itself
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientInfo {
    pub guid: String,
    pub session_id: SessionId,
    pub roots: Vec<RootDescriptor>,
}

impl Serde for ClientInfo {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.guid.ser(writer);
        self.session_id.ser(writer);
        self.roots.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let guid = String::de(reader)?;
        let session_id = SessionId::de(reader)?;
        let roots = Vec::<RootDescriptor>::de(reader)?;
        Ok(Self {
            guid,
            session_id,
            roots,
        })
    }

    fn byte_length(&self) -> usize {
        self.guid.byte_length() + self.session_id.byte_length() + self.roots.byte_length()
    }
}

/// Handshake and heartbeat commands exchanged inside command blobs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// client -> server: a client announces itself
    ClientStarted { guid: String },
    /// client -> server: a client with a session asks for the whole world
    RequestWorld,
    /// client -> server: heartbeat with the last frame the client saw
    ClientRunning {
        session_id: SessionId,
        frame: FrameNumber,
    },
    /// server -> client: the rest of this frame is a full world snapshot
    SendWorld,
    /// server -> client: session granted to the client with this guid
    ClientStartedReply(ClientInfo),
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::ClientStarted { .. } => Opcode::ClientStarted,
            Command::RequestWorld => Opcode::RequestWorld,
            Command::ClientRunning { .. } => Opcode::ClientRunning,
            Command::SendWorld => Opcode::SendWorld,
            Command::ClientStartedReply(_) => Opcode::ClientStartedReply,
        }
    }

    pub fn write(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(self.opcode() as u8);
        match self {
            Command::ClientStarted { guid } => guid.ser(writer),
            Command::RequestWorld | Command::SendWorld => {}
            Command::ClientRunning { session_id, frame } => {
                session_id.ser(writer);
                frame.ser(writer);
            }
            Command::ClientStartedReply(info) => info.ser(writer),
        }
    }

    /// Reads the fields that follow an opcode byte
    pub fn read(opcode: u8, reader: &mut ByteReader) -> Result<Self, DecodeError> {
        let Some(opcode) = Opcode::from_byte(opcode) else {
            return Err(DecodeError::UnknownOpcode { opcode });
        };
        let invalid = |error| DecodeError::InvalidBody {
            kind: BlobKind::Command,
            error,
        };
        let command = match opcode {
            Opcode::ClientStarted => Command::ClientStarted {
                guid: String::de(reader).map_err(invalid)?,
            },
            Opcode::RequestWorld => Command::RequestWorld,
            Opcode::ClientRunning => Command::ClientRunning {
                session_id: SessionId::de(reader).map_err(invalid)?,
                frame: FrameNumber::de(reader).map_err(invalid)?,
            },
            Opcode::SendWorld => Command::SendWorld,
            Opcode::ClientStartedReply => {
                Command::ClientStartedReply(ClientInfo::de(reader).map_err(invalid)?)
            }
        };
        Ok(command)
    }
}
