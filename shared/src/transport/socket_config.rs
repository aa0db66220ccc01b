use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::types::HostType;

/// Where the server and its displays meet. Each role listens on one port and
/// sends to the other: a client's send port is the server's listen port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocketConfig {
    /// Unicast peer address, or the multicast group every role joins
    pub ip: IpAddr,
    /// Port the server receives on
    pub server_listen_port: u16,
    /// Port the server sends to, which clients receive on
    pub server_send_port: u16,
}

impl SocketConfig {
    pub fn new(ip: IpAddr, server_listen_port: u16, server_send_port: u16) -> Self {
        Self {
            ip,
            server_listen_port,
            server_send_port,
        }
    }

    pub fn for_server(&self) -> Endpoint {
        Endpoint {
            ip: self.ip,
            listen_port: self.server_listen_port,
            send_port: self.server_send_port,
        }
    }

    pub fn for_client(&self) -> Endpoint {
        Endpoint {
            ip: self.ip,
            listen_port: self.server_send_port,
            send_port: self.server_listen_port,
        }
    }

    pub fn for_host(&self, host_type: HostType) -> Endpoint {
        match host_type {
            HostType::Server => self.for_server(),
            HostType::Client => self.for_client(),
        }
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::new(239, 255, 42, 58)),
            server_listen_port: 10_001,
            server_send_port: 10_002,
        }
    }
}

/// One role's view of a `SocketConfig`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub listen_port: u16,
    pub send_port: u16,
}

impl Endpoint {
    pub fn send_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.send_port)
    }

    pub fn is_multicast(&self) -> bool {
        self.ip.is_multicast()
    }
}
