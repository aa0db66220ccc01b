use std::fmt;

use lumen_shared::ReadMode;

/// Where a display is in its handshake with the server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    /// Announcing this display's guid until the server grants a session
    ClientStarted,
    /// Holding a session, asking for the world until it arrives
    Blank,
    /// Applying every frame to the mirror and reporting back each tick
    Running,
}

impl ClientState {
    /// Until the world arrives only header and command blobs matter
    pub fn read_mode(&self) -> ReadMode {
        match self {
            ClientState::Running => ReadMode::Full,
            ClientState::ClientStarted | ClientState::Blank => ReadMode::ControlOnly,
        }
    }

    pub fn is_handshaking(&self) -> bool {
        *self != ClientState::Running
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::ClientStarted => "ClientStarted",
            ClientState::Blank => "Blank",
            ClientState::Running => "Running",
        };
        f.write_str(name)
    }
}
