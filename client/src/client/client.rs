use std::{mem, ops::RangeInclusive, time::Duration};

use log::{debug, info, warn};

use lumen_shared::{
    Blob, Changes, ClientInfo, Command, DecodedFrame, FrameNumber, FrameReader, FrameWriter,
    HostType, InputEvent, Io, NodeBlob, NodeId, NodeKind, NodeKinds, NodeRecord, NodeTree,
    PendingChanges, Protocol, ReadMode, RootDescriptor, SessionId, Socket, SocketConfig,
    TreeError, UdpSocket, WorldReader, WorldWriter, NO_FRAME, NO_SESSION,
};

use crate::{
    client::{ClientConfig, ClientState},
    events::{ClientEvent, ClientEvents},
    ClientError, ClientIdentity,
};

/// A display process. Announces itself to the server, keeps a mirror of the
/// server's node tree, and reports back once per tick.
pub struct Client {
    // Protocol
    protocol: Protocol,
    // Session
    identity: ClientIdentity,
    guid: String,
    state: ClientState,
    session_id: SessionId,
    server_frame: FrameNumber,
    roots: Vec<RootDescriptor>,
    // Handshake
    resend_ticks: RangeInclusive<u32>,
    resend_countdown: u32,
    jitter: fastrand::Rng,
    // Connection
    io: Io,
    renew_pending: bool,
    // World
    tree: NodeTree,
    pending: PendingChanges,
    inputs: Vec<InputEvent>,
    // Events
    incoming_events: ClientEvents,
}

impl Client {
    /// Create a new Client
    pub fn new<P: Into<Protocol>>(client_config: ClientConfig, protocol: P) -> Result<Self, ClientError> {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.lock();
        }

        let io = Io::new(HostType::Client, &client_config.connection, &protocol.compression)?;

        let jitter = match client_config.jitter_seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let (low, high) = client_config.handshake_resend_ticks.into_inner();
        let identity = client_config.identity;

        Ok(Self {
            // Protocol
            protocol,
            // Session
            guid: identity.guid_string(),
            identity,
            state: ClientState::ClientStarted,
            session_id: NO_SESSION,
            server_frame: NO_FRAME,
            roots: Vec::new(),
            // Handshake
            resend_ticks: low.min(high)..=low.max(high),
            resend_countdown: 0,
            jitter,
            // Connection
            io,
            renew_pending: false,
            // World
            tree: NodeTree::new(HostType::Client),
            pending: PendingChanges::new(),
            inputs: Vec::new(),
            // Events
            incoming_events: ClientEvents::new(),
        })
    }

    /// Connect through the given socket
    pub fn connect<S: Socket + 'static>(&mut self, socket: S) -> Result<(), ClientError> {
        self.io.load(Box::new(socket))?;
        Ok(())
    }

    /// Connect to the UDP endpoint described by the protocol's socket config
    pub fn connect_udp(&mut self) -> Result<(), ClientError> {
        let socket = UdpSocket::new(self.protocol.socket.for_client());
        self.connect(socket)
    }

    /// Returns whether or not the Client has a socket to talk through
    pub fn is_connected(&self) -> bool {
        self.io.is_loaded()
    }

    /// Returns socket config
    pub fn socket_config(&self) -> &SocketConfig {
        &self.protocol.socket
    }

    /// How often `update` is meant to be called
    pub fn tick_interval(&self) -> Duration {
        self.protocol.tick_interval
    }

    /// Must be called once per tick. Applies whatever the server sent, then
    /// answers in the current state's way.
    pub fn update(&mut self) {
        if self.renew_pending {
            self.renew();
        }
        if !self.io.is_loaded() {
            return;
        }
        if self.io.heard_from_peer() && self.io.has_lost_connection() {
            self.lose_connection();
            return;
        }

        let frames = self.io.receive_frames();
        if frames.is_empty() {
            // the server sends every tick; while it is silent there is nobody
            // to answer
            return;
        }
        for bytes in &frames {
            self.receive_frame(bytes);
        }

        match self.state {
            ClientState::ClientStarted => {
                let command = Command::ClientStarted {
                    guid: self.guid.clone(),
                };
                self.send_handshake(command);
            }
            ClientState::Blank => self.send_handshake(Command::RequestWorld),
            ClientState::Running => self.send_running(),
        }
    }

    /// Returns everything that happened since the last call
    pub fn take_events(&mut self) -> ClientEvents {
        mem::take(&mut self.incoming_events)
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Session granted by the server, `NO_SESSION` before the first reply
    /// and after a lost connection
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Last frame number the server sent
    pub fn server_frame(&self) -> FrameNumber {
        self.server_frame
    }

    /// Output roots the server declared in its reply
    pub fn roots(&self) -> &[RootDescriptor] {
        &self.roots
    }

    /// The protocol this endpoint was built with, locked against changes
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn node_kinds(&self) -> &NodeKinds {
        &self.protocol.node_kinds
    }

    // Mirror

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn get<K: NodeKind>(&self, id: NodeId) -> Option<&K> {
        self.tree.get_as::<K>(id)
    }

    pub fn enumerate(&self) -> Vec<NodeRecord> {
        self.tree.enumerate()
    }

    /// Changes a mirrored node locally. The reported groups go back to the
    /// server with the next running frame.
    pub fn mutate<K: NodeKind, F: FnOnce(&mut K) -> Changes>(
        &mut self,
        id: NodeId,
        mutator: F,
    ) -> Result<(), TreeError> {
        let changes = self.tree.mutate::<K, F>(id, mutator)?;
        let group_count = self.tree.group_count(id).unwrap_or(0);
        self.pending.record(id, &changes, group_count);
        Ok(())
    }

    /// Marks one attribute group of a mirrored node for sending back
    pub fn mark_dirty(&mut self, id: NodeId, group: u8) -> Result<(), TreeError> {
        let group_count = self
            .tree
            .group_count(id)
            .ok_or(TreeError::NodeNotFound { id })?;
        if group >= group_count {
            return Err(TreeError::GroupOutOfRange {
                id,
                group,
                group_count,
            });
        }
        self.pending.mark_dirty(id, group, group_count);
        Ok(())
    }

    /// Local changes waiting for the next running frame
    pub fn dirty_count(&self) -> usize {
        self.pending.len()
    }

    /// Queues pointer input for the server. Input queued before the world
    /// has arrived is dropped.
    pub fn send_input(&mut self, event: InputEvent) {
        self.inputs.push(event);
    }

    // Traffic

    /// Bytes sent since the last call
    pub fn take_bytes_sent(&mut self) -> u64 {
        self.io.take_bytes_sent()
    }

    /// Bytes received since the last call
    pub fn take_bytes_received(&mut self) -> u64 {
        self.io.take_bytes_received()
    }

    // Private methods

    fn set_state(&mut self, state: ClientState) {
        if self.state == state {
            return;
        }
        info!("client state {} -> {}", self.state, state);
        self.state = state;
        // entering a handshake state sends straight away
        self.resend_countdown = 0;
        if state == ClientState::Running {
            self.server_frame = NO_FRAME;
            self.incoming_events.push(ClientEvent::Running);
        }
    }

    // The mirror stays as it is until the next world arrives
    fn lose_connection(&mut self) {
        warn!("server not heard from, renewing sockets");
        self.session_id = NO_SESSION;
        self.incoming_events.push(ClientEvent::ConnectionLost);
        self.set_state(ClientState::ClientStarted);
        self.renew();
    }

    fn renew(&mut self) {
        match self.io.renew() {
            Ok(()) => self.renew_pending = false,
            Err(error) => {
                warn!("failed to renew sockets: {}", error);
                self.renew_pending = true;
            }
        }
    }

    fn receive_frame(&mut self, bytes: &[u8]) {
        let mode = self.state.read_mode();
        let frame = self.decode(bytes, mode);
        if let Some(frame_number) = frame.frame_number {
            self.server_frame = frame_number;
        }

        if self.process_blobs(frame.blobs, mode) {
            // the snapshot's nodes were skipped unread; take everything after
            // its SendWorld from a full read
            let frame = self.decode(bytes, ReadMode::Full);
            let snapshot = frame
                .blobs
                .into_iter()
                .skip_while(|blob| !matches!(blob, Blob::Command(Command::SendWorld)))
                .skip(1)
                .collect();
            self.process_blobs(snapshot, ReadMode::Full);
        }
    }

    fn decode(&self, bytes: &[u8], mode: ReadMode) -> DecodedFrame {
        let frame = FrameReader::new(&self.protocol.node_kinds).read_with(bytes, mode);
        for error in &frame.errors {
            warn!("inbound frame: {}", error);
        }
        frame
    }

    // Returns true when a control-only read moved the client to Running, so
    // the rest of the frame has to be read in full
    fn process_blobs(&mut self, blobs: Vec<Blob>, mode: ReadMode) -> bool {
        for blob in blobs {
            match blob {
                Blob::Command(command) => {
                    self.process_command(command);
                    if mode == ReadMode::ControlOnly && self.state == ClientState::Running {
                        return true;
                    }
                }
                Blob::Node(node) => self.apply_node(&node),
                Blob::Delete(ids) => self.apply_deletes(&ids),
                Blob::Input(_) => warn!("ignoring input blob sent by the server"),
            }
        }
        false
    }

    fn process_command(&mut self, command: Command) {
        match command {
            Command::ClientStartedReply(info) => self.process_reply(info),
            Command::SendWorld => {
                info!("receiving world, session {}", self.session_id);
                self.tree.clear();
                self.pending.clear();
                self.incoming_events.push(ClientEvent::WorldCleared);
                if self.session_id >= 1 {
                    self.set_state(ClientState::Running);
                } else {
                    debug!("world arrived before a session was granted");
                }
            }
            Command::ClientStarted { .. } | Command::RequestWorld | Command::ClientRunning { .. } => {
                warn!("server sent a display-only command {:?}", command.opcode());
            }
        }
    }

    fn process_reply(&mut self, info: ClientInfo) {
        if info.guid != self.guid {
            debug!("session reply for display {} ignored", info.guid);
            return;
        }
        if info.session_id < 1 {
            warn!("server granted invalid session {}", info.session_id);
            return;
        }
        if self.state != ClientState::ClientStarted && info.session_id == self.session_id {
            debug!("repeated reply for session {}", info.session_id);
            return;
        }

        info!(
            "granted session {} with {} roots",
            info.session_id,
            info.roots.len()
        );
        self.session_id = info.session_id;
        self.roots = info.roots;
        self.incoming_events.push(ClientEvent::SessionGranted {
            session_id: self.session_id,
            roots: self.roots.clone(),
        });
        self.set_state(ClientState::Blank);
    }

    fn apply_node(&mut self, node: &NodeBlob) {
        if self.state != ClientState::Running {
            return;
        }
        match WorldReader::apply(&mut self.tree, &self.protocol.node_kinds, node) {
            Ok(id) => self.incoming_events.push(ClientEvent::NodeUpdated { id, tag: node.tag }),
            Err(error) => warn!("node {} not applied: {}", node.id, error),
        }
    }

    fn apply_deletes(&mut self, ids: &[NodeId]) {
        if self.state != ClientState::Running {
            return;
        }
        for id in WorldReader::apply_deletes(&mut self.tree, ids) {
            self.pending.remove(id);
            self.incoming_events.push(ClientEvent::NodeDeleted { id });
        }
    }

    fn send_handshake(&mut self, command: Command) {
        if !self.inputs.is_empty() {
            debug!("dropping {} inputs queued before the world arrived", self.inputs.len());
            self.inputs.clear();
        }
        if self.resend_countdown > 0 {
            self.resend_countdown -= 1;
            return;
        }

        debug!("sending {:?}", command.opcode());
        let mut frame = FrameWriter::new();
        frame.command(&command);
        self.send(frame);

        self.resend_countdown = self.jitter.u32(self.resend_ticks.clone()).saturating_sub(1);
    }

    fn send_running(&mut self) {
        let mut frame = FrameWriter::new();
        frame.command(&Command::ClientRunning {
            session_id: self.session_id,
            frame: self.server_frame,
        });
        let node_count =
            WorldWriter::write_changes(&self.tree, &mut self.pending, &self.protocol.node_kinds, &mut frame);
        if node_count > 0 {
            debug!("sending {} local node changes", node_count);
        }
        for event in self.inputs.drain(..) {
            frame.input(&event);
        }
        self.send(frame);
    }

    fn send(&mut self, frame: FrameWriter) {
        let bytes = frame.finish();
        if let Err(error) = self.io.send_frame(&bytes) {
            warn!("failed to send frame: {}", error);
        }
    }
}
