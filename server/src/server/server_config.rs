use std::default::Default;

use lumen_shared::{ConnectionConfig, FrameNumber, RootDescriptor, RootKind};

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Used to configure the connections with displays
    pub connection: ConnectionConfig,
    /// How many frames a display may fall behind before it is reported as
    /// lagging
    pub disconnection_lag: FrameNumber,
    /// Output roots announced to every display in the session reply
    pub roots: Vec<RootDescriptor>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            disconnection_lag: 180,
            roots: vec![RootDescriptor::new(0, RootKind::Ortho)],
        }
    }
}
