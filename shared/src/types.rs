/// Server-authoritative frame counter carried in every header blob
pub type FrameNumber = i32;
/// Server-issued, connection-lifetime identifier of a client
pub type SessionId = i32;

/// Header frame number meaning "no frame context", used during the handshake
pub const NO_FRAME: FrameNumber = -1;
/// Session id a client holds before the server has granted one
pub const NO_SESSION: SessionId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}
