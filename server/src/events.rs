use std::vec::IntoIter;

use lumen_shared::{InputEvent, SessionId};

/// Something that happened during `Server::update`
#[derive(Clone, Debug, PartialEq)]
pub enum ServerEvent {
    /// A display announced itself and was granted a session
    ClientStarted { guid: String, session_id: SessionId },
    /// A display fell more than the allowed lag behind
    ClientLagging {
        session_id: SessionId,
        guid: String,
        lag: i32,
    },
    /// A lagging display caught up again
    ClientRecovered { session_id: SessionId, guid: String },
    /// Pointer input forwarded by a display. The session is known when the
    /// same frame carried the display's heartbeat.
    Input {
        session_id: Option<SessionId>,
        event: InputEvent,
    },
    /// A full world snapshot went out
    WorldSent { node_count: usize },
    /// No display was heard for too long and the sockets were reopened
    ConnectionRenewed,
}

/// Events collected since the last `Server::take_events`
pub struct ServerEvents {
    events: Vec<ServerEvent>,
}

impl Default for ServerEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerEvents {
    pub(crate) fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServerEvent> {
        self.events.iter()
    }

    pub fn inputs(&self) -> impl Iterator<Item = (Option<SessionId>, &InputEvent)> {
        self.events.iter().filter_map(|event| match event {
            ServerEvent::Input { session_id, event } => Some((*session_id, event)),
            _ => None,
        })
    }

    pub fn has_started_client(&self, guid: &str) -> bool {
        self.events.iter().any(|event| {
            matches!(event, ServerEvent::ClientStarted { guid: started, .. } if started == guid)
        })
    }

    pub(crate) fn push(&mut self, event: ServerEvent) {
        self.events.push(event);
    }
}

impl IntoIterator for ServerEvents {
    type Item = ServerEvent;
    type IntoIter = IntoIter<ServerEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
