//! # Lumen Client
//! A display process: announces itself to the presentation server with a
//! persisted guid, mirrors the server's node tree from the frames it
//! receives, and reports back every tick with its heartbeat, local changes
//! and pointer input.

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

mod client;
mod error;
mod events;
mod identity;

pub use client::{Client, ClientConfig, ClientState};
pub use error::{ClientError, IdentityError};
pub use events::{ClientEvent, ClientEvents};
pub use identity::ClientIdentity;
