use std::{collections::HashMap, net::SocketAddr};

use log::{debug, warn};

use crate::{
    backends::Timer,
    connection::{
        chunker::{PacketChunker, PacketDechunker},
        compression_config::CompressionConfig,
        connection_config::ConnectionConfig,
        decoder::Decoder,
        encoder::Encoder,
        error::ConnectionError,
    },
    transport::{PacketReceiver, PacketSender, Socket},
    types::HostType,
};

// Chunk groups are numbered per sender, so each peer gets its own dechunker
struct PeerDechunker {
    dechunker: PacketDechunker,
    last_heard: u64,
}

/// One role's send and receive paths: compression, chunking, the socket
/// halves, and the liveness timer that notices when the peer goes quiet
pub struct Io {
    socket: Option<Box<dyn Socket>>,
    sender: Option<Box<dyn PacketSender>>,
    receiver: Option<Box<dyn PacketReceiver>>,
    encoder: Option<Encoder>,
    decoder: Option<Decoder>,
    chunker: PacketChunker,
    dechunkers: HashMap<SocketAddr, PeerDechunker>,
    max_frame_bytes: usize,
    max_partial_groups: usize,
    max_peers: usize,
    datagram_count: u64,
    liveness: Timer,
    heard_from_peer: bool,
    max_datagrams_per_tick: usize,
    bytes_sent: u64,
    bytes_received: u64,
}

impl Io {
    pub fn new(
        host_type: HostType,
        connection_config: &ConnectionConfig,
        compression: &Option<CompressionConfig>,
    ) -> Result<Self, ConnectionError> {
        let (outgoing, incoming) = match compression {
            Some(config) => match host_type {
                HostType::Server => (
                    config.server_to_client.clone(),
                    config.client_to_server.clone(),
                ),
                HostType::Client => (
                    config.client_to_server.clone(),
                    config.server_to_client.clone(),
                ),
            },
            None => (None, None),
        };
        let encoder = outgoing.map(Encoder::try_new).transpose()?;
        let decoder = incoming
            .map(|mode| Decoder::try_new(mode, connection_config.max_frame_bytes))
            .transpose()?;

        Ok(Self {
            socket: None,
            sender: None,
            receiver: None,
            encoder,
            decoder,
            chunker: PacketChunker::new(
                connection_config.chunk_size,
                connection_config.max_frame_bytes,
            ),
            dechunkers: HashMap::new(),
            max_frame_bytes: connection_config.max_frame_bytes,
            max_partial_groups: connection_config.max_partial_groups,
            max_peers: connection_config.max_peers.max(1),
            datagram_count: 0,
            liveness: Timer::new(connection_config.disconnection_timeout),
            heard_from_peer: false,
            max_datagrams_per_tick: connection_config.max_datagrams_per_tick,
            bytes_sent: 0,
            bytes_received: 0,
        })
    }

    /// Takes ownership of a socket and opens it
    pub fn load(&mut self, socket: Box<dyn Socket>) -> Result<(), ConnectionError> {
        self.socket = Some(socket);
        self.renew()
    }

    pub fn is_loaded(&self) -> bool {
        self.sender.is_some() && self.receiver.is_some()
    }

    /// Compresses, chunks and sends one complete frame
    pub fn send_frame(&mut self, frame: &[u8]) -> Result<(), ConnectionError> {
        let Some(sender) = self.sender.as_ref() else {
            return Err(ConnectionError::NotConnected);
        };
        let payload = match self.encoder.as_mut() {
            Some(encoder) => encoder.try_encode(frame)?,
            None => frame,
        };
        let datagrams = self.chunker.chunk(payload)?;
        for datagram in &datagrams {
            sender.send(datagram)?;
            self.bytes_sent += datagram.len() as u64;
        }
        Ok(())
    }

    /// Drains waiting datagrams (up to the per-tick bound) and returns every
    /// frame they complete. Damaged datagrams are logged and dropped.
    pub fn receive_frames(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let Some(receiver) = self.receiver.as_mut() else {
            return frames;
        };
        let (max_frame_bytes, max_partial_groups) = (self.max_frame_bytes, self.max_partial_groups);

        for _ in 0..self.max_datagrams_per_tick {
            let (address, datagram) = match receiver.receive() {
                Ok(Some(received)) => received,
                Ok(None) => break,
                Err(error) => {
                    warn!("{}", error);
                    break;
                }
            };

            self.bytes_received += datagram.len() as u64;
            self.datagram_count += 1;
            self.liveness.reset();
            self.heard_from_peer = true;

            if !self.dechunkers.contains_key(&address) && self.dechunkers.len() >= self.max_peers {
                Self::forget_quietest_peer(&mut self.dechunkers);
            }
            let peer = self.dechunkers.entry(address).or_insert_with(|| {
                debug!("first datagram from {}", address);
                PeerDechunker {
                    dechunker: PacketDechunker::new(max_frame_bytes, max_partial_groups),
                    last_heard: 0,
                }
            });
            peer.last_heard = self.datagram_count;

            let payload = match peer.dechunker.receive(datagram) {
                Ok(Some(payload)) => payload,
                Ok(None) => continue,
                Err(error) => {
                    warn!("dropping datagram from {}: {}", address, error);
                    continue;
                }
            };
            match self.decoder.as_mut() {
                Some(decoder) => match decoder.try_decode(&payload) {
                    Ok(frame) => frames.push(frame.to_vec()),
                    Err(error) => warn!("dropping frame from {}: {}", address, error),
                },
                None => frames.push(payload),
            }
        }
        frames
    }

    /// Peers currently holding reassembly state
    pub fn peer_count(&self) -> usize {
        self.dechunkers.len()
    }

    /// Whether the peer has been silent for longer than the timeout
    pub fn has_lost_connection(&self) -> bool {
        self.liveness.ringing()
    }

    /// Whether anything has arrived since the last renew
    pub fn heard_from_peer(&self) -> bool {
        self.heard_from_peer
    }

    /// Recreates both socket halves and starts chunk numbering over
    pub fn renew(&mut self) -> Result<(), ConnectionError> {
        // the old halves must release their ports before rebinding
        self.sender = None;
        self.receiver = None;

        let Some(socket) = self.socket.as_mut() else {
            return Err(ConnectionError::NotConnected);
        };
        let (sender, receiver) = socket.open()?;
        self.sender = Some(sender);
        self.receiver = Some(receiver);

        self.chunker.reset();
        self.dechunkers.clear();
        self.liveness.reset();
        self.heard_from_peer = false;
        debug!("socket opened");
        Ok(())
    }

    fn forget_quietest_peer(dechunkers: &mut HashMap<SocketAddr, PeerDechunker>) {
        let quietest = dechunkers
            .iter()
            .min_by_key(|(_, peer)| peer.last_heard)
            .map(|(address, _)| *address);
        if let Some(address) = quietest {
            debug!("forgetting chunk state of {}", address);
            dechunkers.remove(&address);
        }
    }

    /// Bytes sent since the last call
    pub fn take_bytes_sent(&mut self) -> u64 {
        std::mem::take(&mut self.bytes_sent)
    }

    /// Bytes received since the last call
    pub fn take_bytes_received(&mut self) -> u64 {
        std::mem::take(&mut self.bytes_received)
    }
}
