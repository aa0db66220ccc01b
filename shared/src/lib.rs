//! # Lumen Shared
//! Node tree replication shared between lumen-server & lumen-client: the type
//! registry, the frame format, dirty-delta sync and the datagram transport.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use lumen_serde::{
    ByteReader, ByteWrite, ByteWriter, ConstByteLength, Serde, SerdeErr, UnsignedVariableInteger,
};

mod backends;
mod connection;
mod constants;
mod frame;
mod protocol;
mod transport;
mod types;
mod world;
mod wrapping_number;

pub use backends::Timer;
pub use connection::{
    chunker::{PacketChunker, PacketDechunker},
    compression_config::{CompressionConfig, CompressionMode},
    connection_config::ConnectionConfig,
    decoder::Decoder,
    encoder::Encoder,
    error::{ChunkError, ConnectionError, DecoderError, EncoderError},
    io::Io,
};
pub use constants::{
    CHUNK_HEADER_BYTES, DEFAULT_CHUNK_SIZE, MAX_DATAGRAM_BYTES, MAX_FRAME_BYTES,
    MAX_PARTIAL_GROUPS,
};
pub use frame::{
    blob::{Blob, BlobKind, NodeBlob, TERMINATOR},
    command::{ClientInfo, Command, Opcode, RootDescriptor, RootKind},
    error::DecodeError,
    frame_reader::{DecodedFrame, FrameReader, ReadMode},
    frame_writer::FrameWriter,
    input::{InputEvent, InputPhase},
};
pub use protocol::{Protocol, ProtocolError, ProtocolPlugin};
pub use transport::{
    error::{RecvError, SendError, TransportError},
    socket_config::{Endpoint, SocketConfig},
    udp::UdpSocket,
    PacketReceiver, PacketSender, Socket,
};
pub use types::{FrameNumber, HostType, SessionId, NO_FRAME, NO_SESSION};
pub use world::{
    delete_list::DeleteList,
    node::{
        changes::Changes,
        diff_mask::DiffMask,
        error::{RegistryError, TreeError},
        node_kinds::{NodeKinds, TypeTag},
        replicate::{NodeKind, Replicate},
    },
    node_tree::{NodeId, NodeRecord, NodeTree},
    pending_changes::PendingChanges,
    world_reader::WorldReader,
    world_writer::WorldWriter,
};
