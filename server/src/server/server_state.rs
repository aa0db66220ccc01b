use std::fmt;

/// What the server does on its next tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServerState {
    /// Send every node so all displays rebuild their mirror, then run
    SendWorld,
    /// Answer displays that just announced themselves, then send the world
    ClientStartedReply,
    /// Stream dirty changes and deletes, and read what displays send back
    Running,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::SendWorld => "SendWorld",
            ServerState::ClientStartedReply => "ClientStartedReply",
            ServerState::Running => "Running",
        };
        f.write_str(name)
    }
}
