use thiserror::Error;

use lumen_shared::{ConnectionError, TreeError};

/// Errors surfaced by the server's public API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// The socket or codec could not be set up
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// A node operation was rejected
    #[error("Node tree error: {0}")]
    Tree(#[from] TreeError),
}
