use std::path::PathBuf;

use thiserror::Error;

use lumen_shared::{ConnectionError, TreeError};

/// Errors surfaced by the client's public API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The socket or codec could not be set up
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A mirror operation was rejected
    #[error("Node tree error: {0}")]
    Tree(#[from] TreeError),

    /// The persisted identity could not be read or written
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

/// Errors from loading or storing a display's identity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The platform reports no directory for application state
    #[error("No platform directory available to store the display identity")]
    NoStateDirectory,

    /// Reading, writing or creating the identity file failed
    #[error("Identity file {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// The identity could not be turned into JSON
    #[error("Failed to encode identity: {reason}")]
    Encode { reason: String },
}
