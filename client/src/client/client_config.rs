use std::{default::Default, ops::RangeInclusive};

use lumen_shared::ConnectionConfig;

use crate::ClientIdentity;

/// Contains Config properties which will be used by a Client
#[derive(Clone)]
pub struct ClientConfig {
    /// Used to configure the connection with the server
    pub connection: ConnectionConfig,
    /// The guid this display announces itself with. Defaults to a fresh,
    /// unpersisted identity; use `ClientIdentity::load_or_create` to keep
    /// the same guid across restarts.
    pub identity: ClientIdentity,
    /// Ticks between handshake resends, drawn uniformly from this range for
    /// every resend so displays that boot together spread out
    pub handshake_resend_ticks: RangeInclusive<u32>,
    /// Seeds the resend jitter. `None` seeds from entropy.
    pub jitter_seed: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            identity: ClientIdentity::generate(),
            handshake_resend_ticks: 45..=75,
            jitter_seed: None,
        }
    }
}
