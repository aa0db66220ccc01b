//! In-memory sockets for end-to-end tests. One server and any number of
//! clients share a segment: whatever the server sends reaches every client,
//! whatever a client sends reaches the server tagged with that client's
//! address. No network I/O.
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use lumen_shared::{PacketReceiver, PacketSender, RecvError, SendError, Socket, TransportError};

pub const FAKE_SERVER_ADDR: &str = "127.0.0.1:54321";
const FIRST_CLIENT_PORT: u16 = 12345;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Role {
    Server,
    Client(SocketAddr),
}

struct ClientInbox {
    address: SocketAddr,
    queue: VecDeque<Vec<u8>>,
    opens: usize,
}

#[derive(Default)]
struct Segment {
    server_inbox: VecDeque<(SocketAddr, Vec<u8>)>,
    client_inboxes: Vec<ClientInbox>,
    server_opens: usize,
    captured: Vec<Vec<u8>>,
    dropping: bool,
}

impl Segment {
    fn client_mut(&mut self, address: SocketAddr) -> Option<&mut ClientInbox> {
        self.client_inboxes
            .iter_mut()
            .find(|inbox| inbox.address == address)
    }
}

/// The shared medium. Cloning gives another handle to the same segment.
#[derive(Clone, Default)]
pub struct LocalHub {
    segment: Arc<Mutex<Segment>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server_socket(&self) -> LocalSocket {
        LocalSocket {
            segment: self.segment.clone(),
            role: Role::Server,
        }
    }

    /// A socket for a new client with its own fake address
    pub fn client_socket(&self) -> LocalSocket {
        let mut segment = self.lock();
        let port = FIRST_CLIENT_PORT + segment.client_inboxes.len() as u16;
        let address = SocketAddr::from(([127, 0, 0, 1], port));
        segment.client_inboxes.push(ClientInbox {
            address,
            queue: VecDeque::new(),
            opens: 0,
        });
        LocalSocket {
            segment: self.segment.clone(),
            role: Role::Client(address),
        }
    }

    /// While set, every datagram in either direction is lost
    pub fn set_dropping(&self, dropping: bool) {
        self.lock().dropping = dropping;
    }

    /// Every datagram the server sent since the last call, chunk headers
    /// included
    pub fn take_server_datagrams(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.lock().captured)
    }

    /// Delivers a raw datagram to the server as if `from` had sent it
    pub fn inject_to_server(&self, from: SocketAddr, datagram: Vec<u8>) {
        self.lock().server_inbox.push_back((from, datagram));
    }

    /// Delivers a raw datagram to every client as if the server had sent it
    pub fn inject_to_clients(&self, datagram: Vec<u8>) {
        for inbox in &mut self.lock().client_inboxes {
            inbox.queue.push_back(datagram.clone());
        }
    }

    pub fn server_opens(&self) -> usize {
        self.lock().server_opens
    }

    /// How often the client socket with this index was opened
    pub fn client_opens(&self, index: usize) -> usize {
        self.lock()
            .client_inboxes
            .get(index)
            .map(|inbox| inbox.opens)
            .unwrap_or(0)
    }

    pub fn client_addr(&self, index: usize) -> Option<SocketAddr> {
        self.lock()
            .client_inboxes
            .get(index)
            .map(|inbox| inbox.address)
    }

    fn lock(&self) -> MutexGuard<'_, Segment> {
        self.segment.lock().unwrap()
    }
}

/// One endpoint on a `LocalHub`
pub struct LocalSocket {
    segment: Arc<Mutex<Segment>>,
    role: Role,
}

impl Socket for LocalSocket {
    fn open(&mut self) -> Result<(Box<dyn PacketSender>, Box<dyn PacketReceiver>), TransportError> {
        {
            let mut segment = self.segment.lock().unwrap();
            match self.role {
                Role::Server => {
                    segment.server_opens += 1;
                    segment.server_inbox.clear();
                }
                Role::Client(address) => {
                    if let Some(inbox) = segment.client_mut(address) {
                        inbox.opens += 1;
                        inbox.queue.clear();
                    }
                }
            }
        }
        Ok((
            Box::new(LocalSender {
                segment: self.segment.clone(),
                role: self.role,
            }),
            Box::new(LocalReceiver {
                segment: self.segment.clone(),
                role: self.role,
                last_payload: Vec::new(),
            }),
        ))
    }
}

struct LocalSender {
    segment: Arc<Mutex<Segment>>,
    role: Role,
}

impl PacketSender for LocalSender {
    fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        let mut segment = self.segment.lock().unwrap();
        match self.role {
            Role::Server => {
                segment.captured.push(payload.to_vec());
                if segment.dropping {
                    return Ok(());
                }
                for inbox in &mut segment.client_inboxes {
                    inbox.queue.push_back(payload.to_vec());
                }
            }
            Role::Client(address) => {
                if segment.dropping {
                    return Ok(());
                }
                segment.server_inbox.push_back((address, payload.to_vec()));
            }
        }
        Ok(())
    }
}

struct LocalReceiver {
    segment: Arc<Mutex<Segment>>,
    role: Role,
    last_payload: Vec<u8>,
}

impl PacketReceiver for LocalReceiver {
    fn receive(&mut self) -> Result<Option<(SocketAddr, &[u8])>, RecvError> {
        let next = {
            let mut segment = self.segment.lock().unwrap();
            match self.role {
                Role::Server => segment.server_inbox.pop_front(),
                Role::Client(address) => {
                    let server: SocketAddr = FAKE_SERVER_ADDR.parse().unwrap();
                    segment
                        .client_mut(address)
                        .and_then(|inbox| inbox.queue.pop_front())
                        .map(|payload| (server, payload))
                }
            }
        };
        match next {
            Some((address, payload)) => {
                self.last_payload = payload;
                Ok(Some((address, &self.last_payload)))
            }
            None => Ok(None),
        }
    }
}

/// A hub with one server socket and one client socket already made
pub struct LocalSocketPair {
    pub hub: LocalHub,
    pub server: LocalSocket,
    pub client: LocalSocket,
}

impl LocalSocketPair {
    pub fn new() -> Self {
        let hub = LocalHub::new();
        let server = hub.server_socket();
        let client = hub.client_socket();
        Self {
            hub,
            server,
            client,
        }
    }
}

impl Default for LocalSocketPair {
    fn default() -> Self {
        Self::new()
    }
}
