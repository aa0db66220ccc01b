use std::vec::IntoIter;

use lumen_shared::{NodeId, RootDescriptor, SessionId, TypeTag};

/// Something that happened during `Client::update`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientEvent {
    /// The server answered this display's announcement
    SessionGranted {
        session_id: SessionId,
        roots: Vec<RootDescriptor>,
    },
    /// A world snapshot started; the mirror was emptied
    WorldCleared,
    /// The mirror is complete and follows the server's frames
    Running,
    /// A node was created or updated from a node blob
    NodeUpdated { id: NodeId, tag: TypeTag },
    /// A node was removed, with its subtree already listed
    NodeDeleted { id: NodeId },
    /// Nothing arrived for too long; the sockets were reopened and the
    /// handshake starts over
    ConnectionLost,
}

/// Events collected since the last `Client::take_events`
pub struct ClientEvents {
    events: Vec<ClientEvent>,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientEvent> {
        self.events.iter()
    }

    pub fn updated_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|event| match event {
            ClientEvent::NodeUpdated { id, .. } => Some(*id),
            _ => None,
        })
    }

    pub fn deleted_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.events.iter().filter_map(|event| match event {
            ClientEvent::NodeDeleted { id } => Some(*id),
            _ => None,
        })
    }

    pub fn contains(&self, event: &ClientEvent) -> bool {
        self.events.contains(event)
    }

    pub(crate) fn push(&mut self, event: ClientEvent) {
        self.events.push(event);
    }
}

impl IntoIterator for ClientEvents {
    type Item = ClientEvent;
    type IntoIter = IntoIter<ClientEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
