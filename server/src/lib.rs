//! # Lumen Server
//! The presentation server: holds the authoritative node tree, grants
//! sessions to displays that announce themselves, and each tick streams the
//! tree's changes to every display over UDP.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use lumen_shared::{
        ByteReader, ByteWrite, Changes, CompressionConfig, CompressionMode, ConnectionConfig,
        DiffMask, FrameNumber, InputEvent, InputPhase, NodeId, NodeKind, NodeRecord, Protocol,
        ProtocolPlugin, Replicate, RootDescriptor, RootKind, Serde, SerdeErr, SessionId, Socket,
        SocketConfig, TreeError, TypeTag, UdpSocket,
    };
}

mod error;
mod events;
mod roster;
mod server;

pub use error::ServerError;
pub use events::{ServerEvent, ServerEvents};
pub use roster::{ClientRecord, ClientRoster, RosterChange};
pub use server::{Server, ServerConfig, ServerState};
