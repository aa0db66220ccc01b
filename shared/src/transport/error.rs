use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while opening or using a datagram socket
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Binding the local listen socket failed
    #[error("Failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    /// Joining the configured multicast group failed
    #[error("Failed to join multicast group {group}: {reason}")]
    JoinMulticast { group: String, reason: String },

    /// Configuring the socket failed
    #[error("Failed to configure socket: {reason}")]
    Configure { reason: String },
}

/// A datagram could not be handed to the socket
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to send a datagram of {length} bytes: {reason}")]
pub struct SendError {
    pub length: usize,
    pub reason: String,
}

/// The socket failed while polling for datagrams
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to receive a datagram: {reason}")]
pub struct RecvError {
    pub reason: String,
}
