use std::{
    io::ErrorKind,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket as StdUdpSocket},
};

use log::info;
use socket2::{Domain, Protocol as IpProtocol, Socket as RawSocket, Type};

use crate::{
    constants::MAX_DATAGRAM_BYTES,
    transport::{
        error::{RecvError, SendError, TransportError},
        socket_config::Endpoint,
        PacketReceiver, PacketSender, Socket,
    },
};

/// Non-blocking UDP endpoint. Listens on the endpoint's listen port and sends
/// to `ip:send_port`; joins the group first when `ip` is multicast.
pub struct UdpSocket {
    endpoint: Endpoint,
}

impl UdpSocket {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    fn unspecified(ip: &IpAddr) -> IpAddr {
        match ip {
            IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    fn bind(addr: SocketAddr) -> Result<StdUdpSocket, TransportError> {
        let socket = StdUdpSocket::bind(addr).map_err(|error| TransportError::Bind {
            addr,
            reason: error.to_string(),
        })?;
        socket
            .set_nonblocking(true)
            .map_err(|error| TransportError::Configure {
                reason: error.to_string(),
            })?;
        Ok(socket)
    }

    // Several displays on one host listen on the same group and port
    fn bind_shared(addr: SocketAddr) -> Result<StdUdpSocket, TransportError> {
        let bind_error = |error: std::io::Error| TransportError::Bind {
            addr,
            reason: error.to_string(),
        };
        let socket = RawSocket::new(Domain::for_address(addr), Type::DGRAM, Some(IpProtocol::UDP))
            .map_err(bind_error)?;
        socket.set_reuse_address(true).map_err(bind_error)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos", target_os = "cygwin"))))]
        socket.set_reuse_port(true).map_err(bind_error)?;
        socket.bind(&addr.into()).map_err(bind_error)?;
        socket
            .set_nonblocking(true)
            .map_err(|error| TransportError::Configure {
                reason: error.to_string(),
            })?;
        Ok(socket.into())
    }

    fn join_group(&self, socket: &StdUdpSocket) -> Result<(), TransportError> {
        let join_error = |error: std::io::Error| TransportError::JoinMulticast {
            group: self.endpoint.ip.to_string(),
            reason: error.to_string(),
        };
        match self.endpoint.ip {
            IpAddr::V4(group) => {
                socket
                    .join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)
                    .map_err(join_error)?;
                socket.set_multicast_loop_v4(true).map_err(join_error)?;
            }
            IpAddr::V6(group) => {
                socket.join_multicast_v6(&group, 0).map_err(join_error)?;
                socket.set_multicast_loop_v6(true).map_err(join_error)?;
            }
        }
        Ok(())
    }
}

impl Socket for UdpSocket {
    fn open(&mut self) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), TransportError> {
        let local_ip = Self::unspecified(&self.endpoint.ip);

        let listen_addr = SocketAddr::new(local_ip, self.endpoint.listen_port);
        let receive_socket = if self.endpoint.is_multicast() {
            let socket = Self::bind_shared(listen_addr)?;
            self.join_group(&socket)?;
            socket
        } else {
            Self::bind(listen_addr)?
        };

        let send_socket = Self::bind(SocketAddr::new(local_ip, 0))?;

        info!(
            "UDP socket listening on {}, sending to {}",
            listen_addr,
            self.endpoint.send_addr()
        );

        let sender = UdpPacketSender {
            socket: send_socket,
            peer: self.endpoint.send_addr(),
        };
        let receiver = UdpPacketReceiver {
            socket: receive_socket,
            buffer: vec![0; MAX_DATAGRAM_BYTES].into_boxed_slice(),
        };
        Ok((Box::new(sender), Box::new(receiver)))
    }
}

struct UdpPacketSender {
    socket: StdUdpSocket,
    peer: SocketAddr,
}

impl PacketSender for UdpPacketSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        match self.socket.send_to(payload, self.peer) {
            Ok(_) => Ok(()),
            // a full send buffer drops the datagram, as the network would
            Err(error) if error.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(error) => Err(SendError {
                length: payload.len(),
                reason: error.to_string(),
            }),
        }
    }
}

struct UdpPacketReceiver {
    socket: StdUdpSocket,
    buffer: Box<[u8]>,
}

impl PacketReceiver for UdpPacketReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        match self.socket.recv_from(&mut self.buffer) {
            Ok((length, address)) => Ok(Some((address, &self.buffer[..length]))),
            Err(error) if error.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(RecvError {
                reason: error.to_string(),
            }),
        }
    }
}
