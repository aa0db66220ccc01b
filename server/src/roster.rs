use std::collections::HashMap;

use log::{debug, info, warn};

use lumen_shared::{FrameNumber, SessionId, NO_SESSION};

/// One display the server has granted a session to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientRecord {
    pub guid: String,
    pub session_id: SessionId,
    /// Last frame the display reported seeing, once it has reported at all
    pub last_frame: Option<FrameNumber>,
    /// Whether the display is currently flagged as too far behind
    pub lagging: bool,
}

/// A change in a display's standing, found by `ClientRoster::compare`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterChange {
    Lagging {
        session_id: SessionId,
        guid: String,
        lag: FrameNumber,
    },
    Recovered {
        session_id: SessionId,
        guid: String,
    },
}

/// Every display that has announced itself, keyed by session id. A guid keeps
/// its session id across reconnects.
pub struct ClientRoster {
    clients: HashMap<SessionId, ClientRecord>,
    sessions_by_guid: HashMap<String, SessionId>,
    next_session: SessionId,
    disconnection_lag: FrameNumber,
}

impl ClientRoster {
    pub fn new(disconnection_lag: FrameNumber) -> Self {
        Self {
            clients: HashMap::new(),
            sessions_by_guid: HashMap::new(),
            next_session: 1,
            disconnection_lag,
        }
    }

    /// Registers a display announcing itself and returns its session id. A
    /// known guid gets its old session back. An empty guid cannot be told
    /// apart from any other display and gets `NO_SESSION`.
    pub fn start_client(&mut self, guid: &str) -> SessionId {
        if guid.is_empty() {
            warn!("display announced itself without a guid");
            return NO_SESSION;
        }

        if let Some(session_id) = self.sessions_by_guid.get(guid).copied() {
            if let Some(record) = self.clients.get_mut(&session_id) {
                record.last_frame = None;
                record.lagging = false;
            }
            debug!("display {} restarted, keeping session {}", guid, session_id);
            return session_id;
        }

        let session_id = self.next_session;
        // session ids stay positive
        self.next_session = match self.next_session.checked_add(1) {
            Some(next) => next,
            None => 1,
        };
        self.sessions_by_guid.insert(guid.to_string(), session_id);
        self.clients.insert(
            session_id,
            ClientRecord {
                guid: guid.to_string(),
                session_id,
                last_frame: None,
                lagging: false,
            },
        );
        info!("display {} granted session {}", guid, session_id);
        session_id
    }

    /// Records a heartbeat. Returns false for a session this server never
    /// granted.
    pub fn reporting_in(&mut self, session_id: SessionId, frame: FrameNumber) -> bool {
        match self.clients.get_mut(&session_id) {
            Some(record) => {
                record.last_frame = Some(frame);
                true
            }
            None => false,
        }
    }

    /// Checks every display's lag against the current server frame. Each
    /// display is reported once when it falls behind and once when it
    /// catches up again.
    pub fn compare(&mut self, server_frame: FrameNumber) -> Vec<RosterChange> {
        let mut changes = Vec::new();
        for record in self.clients.values_mut() {
            let Some(last_frame) = record.last_frame else {
                continue;
            };
            let lag = server_frame.saturating_sub(last_frame);
            let behind = lag > self.disconnection_lag;
            if behind && !record.lagging {
                record.lagging = true;
                warn!(
                    "display {} (session {}) is {} frames behind",
                    record.guid, record.session_id, lag
                );
                changes.push(RosterChange::Lagging {
                    session_id: record.session_id,
                    guid: record.guid.clone(),
                    lag,
                });
            } else if !behind && record.lagging {
                record.lagging = false;
                info!(
                    "display {} (session {}) caught up",
                    record.guid, record.session_id
                );
                changes.push(RosterChange::Recovered {
                    session_id: record.session_id,
                    guid: record.guid.clone(),
                });
            }
        }
        changes.sort_by_key(|change| match change {
            RosterChange::Lagging { session_id, .. } | RosterChange::Recovered { session_id, .. } => {
                *session_id
            }
        });
        changes
    }

    pub fn session_of(&self, guid: &str) -> Option<SessionId> {
        self.sessions_by_guid.get(guid).copied()
    }

    pub fn get(&self, session_id: SessionId) -> Option<&ClientRecord> {
        self.clients.get(&session_id)
    }

    /// Records in session order
    pub fn clients(&self) -> Vec<&ClientRecord> {
        let mut records: Vec<&ClientRecord> = self.clients.values().collect();
        records.sort_by_key(|record| record.session_id);
        records
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
