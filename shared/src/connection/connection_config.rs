use std::{default::Default, time::Duration};

use crate::constants::{DEFAULT_CHUNK_SIZE, MAX_FRAME_BYTES, MAX_PARTIAL_GROUPS};

/// Contains Config properties which will be used by both ends of a connection
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Time without any inbound datagram after which the connection is
    /// considered lost
    pub disconnection_timeout: Duration,
    /// Payload bytes carried by each datagram
    pub chunk_size: usize,
    /// Largest frame that will be sent or reassembled
    pub max_frame_bytes: usize,
    /// Incomplete chunk groups held for reassembly at once
    pub max_partial_groups: usize,
    /// Upper bound on datagrams drained from the socket in one tick
    pub max_datagrams_per_tick: usize,
    /// Senders whose chunk reassembly state is kept at once
    pub max_peers: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            disconnection_timeout: Duration::from_secs(5),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_frame_bytes: MAX_FRAME_BYTES,
            max_partial_groups: MAX_PARTIAL_GROUPS,
            max_datagrams_per_tick: 4096,
            max_peers: 64,
        }
    }
}
