use std::net::SocketAddr;

pub mod error;
pub mod socket_config;
pub mod udp;

use error::{RecvError, SendError, TransportError};

/// Opens the send and receive halves of a datagram endpoint. Called again to
/// renew both halves after the connection is lost.
pub trait Socket: Send {
    fn open(&mut self) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), TransportError>;
}

pub trait PacketSender: Send + Sync {
    /// Sends one datagram to the peer
    fn send(&self, payload: &[u8]) -> Result<(), SendError>;
}

pub trait PacketReceiver: Send + Sync {
    /// Returns the next datagram and the address it came from, if one is
    /// waiting. Never blocks.
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError>;
}
