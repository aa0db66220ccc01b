use thiserror::Error;

use crate::transport::error::{SendError, TransportError};

/// Errors that can occur while compressing outbound frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    /// Failed to create compressor with the specified configuration
    #[error("Failed to create compressor with compression level {level}")]
    CompressorCreationFailed { level: i32 },

    /// Failed to create compressor with dictionary
    #[error("Failed to create compressor with dictionary (compression level {level})")]
    CompressorWithDictionaryFailed { level: i32 },

    /// Compression operation failed
    #[error("Failed to compress payload of {payload_size} bytes")]
    CompressionFailed { payload_size: usize },
}

/// Errors that can occur while decompressing inbound frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    /// Failed to create decompressor
    #[error("Failed to create decompressor")]
    DecompressorCreationFailed,

    /// Failed to create decompressor with dictionary
    #[error("Failed to create decompressor with dictionary")]
    DecompressorWithDictionaryFailed,

    /// Decompression operation failed (SECURITY: potentially malicious payload)
    #[error("Failed to decompress payload of {payload_size} bytes (possible malformed or malicious data)")]
    DecompressionFailed { payload_size: usize },
}

/// Errors that can occur while splitting or reassembling frames
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// A frame is larger than the transport will carry
    #[error("Frame of {length} bytes exceeds the maximum of {max}")]
    FrameTooLarge { length: usize, max: usize },

    /// A datagram too short to hold a chunk header
    #[error("Datagram of {length} bytes is too short for a chunk header")]
    MalformedHeader { length: usize },

    /// A chunk header that contradicts itself (SECURITY: potentially malicious packet)
    #[error("Invalid chunk {index}/{count} of group {group_id} declaring {total_len} bytes")]
    InvalidChunk {
        group_id: u32,
        index: u16,
        count: u16,
        total_len: u32,
    },

    /// A chunk whose header disagrees with earlier chunks of its group
    #[error("Chunk of group {group_id} disagrees with the group's earlier chunks")]
    InconsistentGroup { group_id: u32 },

    /// A reassembled group does not add up to its declared length
    #[error("Group {group_id} reassembled to {actual} bytes, expected {expected}")]
    LengthMismatch {
        group_id: u32,
        expected: usize,
        actual: usize,
    },
}

/// General connection-level errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// Encoder error
    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    /// Decoder error
    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),

    /// Chunking error
    #[error("Chunk error: {0}")]
    Chunk(#[from] ChunkError),

    /// Socket could not be opened
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Datagram could not be sent
    #[error("Send error: {0}")]
    Send(#[from] SendError),

    /// No socket has been loaded yet
    #[error("No socket loaded. Call `listen()` or `connect()` first")]
    NotConnected,
}
