/// Payload bytes per datagram before the chunk header is added
pub const DEFAULT_CHUNK_SIZE: usize = 1400;
/// Size of the header prepended to every chunk
pub const CHUNK_HEADER_BYTES: usize = 12;
/// Largest frame the transport will send or reassemble
pub const MAX_FRAME_BYTES: usize = 2_000_000;
/// Partial chunk groups held for reassembly at once
pub const MAX_PARTIAL_GROUPS: usize = 32;
/// Largest single datagram a socket will read
pub const MAX_DATAGRAM_BYTES: usize = 65_536;
