use std::time::Duration;

use crate::{
    connection::compression_config::CompressionConfig,
    transport::socket_config::SocketConfig,
    world::node::{node_kinds::NodeKinds, replicate::NodeKind},
};

pub mod error;
pub use error::ProtocolError;

// Protocol Plugin
pub trait ProtocolPlugin {
    fn build(&self, protocol: &mut Protocol);
}

// Protocol
pub struct Protocol {
    pub node_kinds: NodeKinds,
    /// Used to configure the underlying socket
    pub socket: SocketConfig,
    /// The duration between each tick
    pub tick_interval: Duration,
    /// Configuration used to control compression parameters
    pub compression: Option<CompressionConfig>,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            node_kinds: NodeKinds::new(),
            socket: SocketConfig::default(),
            tick_interval: Duration::from_micros(16_667),
            compression: None,
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> &mut Self {
        self.check_lock();
        plugin.build(self);
        self
    }

    pub fn socket_config(&mut self, config: SocketConfig) -> &mut Self {
        self.check_lock();
        self.socket = config;
        self
    }

    pub fn tick_interval(&mut self, duration: Duration) -> &mut Self {
        self.check_lock();
        self.tick_interval = duration;
        self
    }

    pub fn compression(&mut self, config: CompressionConfig) -> &mut Self {
        self.check_lock();
        self.compression = Some(config);
        self
    }

    pub fn add_kind<K: NodeKind>(&mut self) -> &mut Self {
        self.check_lock();
        self.node_kinds.add_kind::<K>();
        self
    }

    // Non-panicking builder methods

    pub fn try_add_plugin<P: ProtocolPlugin>(&mut self, plugin: P) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        plugin.build(self);
        Ok(self)
    }

    pub fn try_socket_config(&mut self, config: SocketConfig) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.socket = config;
        Ok(self)
    }

    pub fn try_tick_interval(&mut self, duration: Duration) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.tick_interval = duration;
        Ok(self)
    }

    pub fn try_compression(&mut self, config: CompressionConfig) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.compression = Some(config);
        Ok(self)
    }

    pub fn try_add_kind<K: NodeKind>(&mut self) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.node_kinds.try_add_kind::<K>()?;
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}
