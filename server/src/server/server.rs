use std::{mem, time::Duration};

use log::{debug, info, warn};

use lumen_shared::{
    Blob, Changes, ClientInfo, Command, DecodedFrame, DeleteList, FrameNumber, FrameReader, FrameWriter,
    HostType, Io, NodeBlob, NodeId, NodeKind, NodeKinds, NodeRecord, NodeTree, PendingChanges,
    Protocol, Replicate, RootDescriptor, SessionId, Socket, SocketConfig, TreeError, TypeTag,
    UdpSocket, WorldReader, WorldWriter, NO_FRAME, NO_SESSION,
};

use crate::{
    events::{ServerEvent, ServerEvents},
    roster::{ClientRoster, RosterChange},
    server::{ServerConfig, ServerState},
    ServerError,
};

/// The presentation server. Owns the authoritative node tree and, one
/// `update` per tick, streams its changes to every display.
pub struct Server {
    // Protocol
    protocol: Protocol,
    roots: Vec<RootDescriptor>,
    // Connection
    io: Io,
    state: ServerState,
    frame: FrameNumber,
    roster: ClientRoster,
    pending_replies: Vec<String>,
    // World
    tree: NodeTree,
    pending: PendingChanges,
    deletes: DeleteList,
    // Events
    incoming_events: ServerEvents,
}

impl Server {
    /// Create a new Server
    pub fn new<P: Into<Protocol>>(server_config: ServerConfig, protocol: P) -> Result<Self, ServerError> {
        let mut protocol: Protocol = protocol.into();
        if !protocol.is_locked() {
            protocol.lock();
        }

        let io = Io::new(HostType::Server, &server_config.connection, &protocol.compression)?;

        Ok(Self {
            // Protocol
            protocol,
            roots: server_config.roots,
            // Connection
            io,
            state: ServerState::SendWorld,
            frame: NO_FRAME,
            roster: ClientRoster::new(server_config.disconnection_lag),
            pending_replies: Vec::new(),
            // World
            tree: NodeTree::new(HostType::Server),
            pending: PendingChanges::new(),
            deletes: DeleteList::new(),
            // Events
            incoming_events: ServerEvents::new(),
        })
    }

    /// Listen on the given socket
    pub fn listen<S: Socket + 'static>(&mut self, socket: S) -> Result<(), ServerError> {
        self.io.load(Box::new(socket))?;
        Ok(())
    }

    /// Listen on the UDP endpoint described by the protocol's socket config
    pub fn listen_udp(&mut self) -> Result<(), ServerError> {
        let socket = UdpSocket::new(self.protocol.socket.for_server());
        self.listen(socket)
    }

    /// Returns whether or not the Server has a socket to talk through
    pub fn is_listening(&self) -> bool {
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

    /// Must be called once per tick. Sends this tick's frame and processes
    /// whatever the displays sent.
    pub fn update(&mut self) {
        if !self.io.is_loaded() {
            return;
        }
        self.maintain_socket();

        match self.state {
            ServerState::ClientStartedReply => self.send_started_replies(),
            ServerState::SendWorld => self.send_world(),
            ServerState::Running => self.run_frame(),
        }
    }

    /// Returns everything that happened since the last call
    pub fn take_events(&mut self) -> ServerEvents {
        mem::take(&mut self.incoming_events)
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Frame number the next running frame will carry
    pub fn frame(&self) -> FrameNumber {
        self.frame
    }

    pub fn roster(&self) -> &ClientRoster {
        &self.roster
    }

    /// The protocol this endpoint was built with, locked against changes
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn node_kinds(&self) -> &NodeKinds {
        &self.protocol.node_kinds
    }

    /// Resends the whole tree on the next tick
    pub fn request_full_sync(&mut self) {
        if self.state == ServerState::Running {
            self.set_state(ServerState::SendWorld);
        }
    }

    // Roots

    pub fn roots(&self) -> &[RootDescriptor] {
        &self.roots
    }

    /// Replaces the announced output roots. Displays learn them the next
    /// time they announce themselves.
    pub fn set_roots(&mut self, roots: Vec<RootDescriptor>) {
        self.roots = roots;
    }

    // Nodes

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    /// Every node with its parent and type tag, parents first
    pub fn enumerate(&self) -> Vec<NodeRecord> {
        self.tree.enumerate()
    }

    /// Adds a node. New nodes are fully dirty so the next frame carries all
    /// of their groups.
    pub fn insert<K: NodeKind>(&mut self, parent: Option<NodeId>, node: K) -> Result<NodeId, TreeError> {
        self.insert_boxed(parent, Box::new(node))
    }

    pub fn insert_boxed(
        &mut self,
        parent: Option<NodeId>,
        node: Box<dyn Replicate>,
    ) -> Result<NodeId, TreeError> {
        let name = node.kind_name();
        if self.protocol.node_kinds.tag_for_name(name).is_none() {
            return Err(TreeError::KindNotRegistered { name });
        }
        let group_count = node.group_count();
        let id = self.tree.insert(parent, node)?;
        self.pending.mark_node(id, group_count);
        Ok(id)
    }

    /// Mutates a node; the groups the mutator reports go out next frame
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

    /// Marks one attribute group of a node as changed
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

    /// Removes a node and its subtree; displays drop them next frame
    pub fn delete(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        let removed = self.tree.delete(id)?;
        for removed_id in &removed {
            self.pending.remove(*removed_id);
        }
        self.deletes.extend(removed.iter().copied());
        Ok(removed)
    }

    /// Nodes with changes that have not been sent yet
    pub fn dirty_count(&self) -> usize {
        self.pending.len()
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

    fn set_state(&mut self, state: ServerState) {
        if self.state != state {
            info!("server state {} -> {}", self.state, state);
            self.state = state;
        }
    }

    // Displays that went quiet after being heard leave the sockets in an
    // unknown state; reopen them and start over with a full sync
    fn maintain_socket(&mut self) {
        if !self.io.heard_from_peer() || !self.io.has_lost_connection() {
            return;
        }
        warn!("no display heard from, renewing sockets");
        if let Err(error) = self.io.renew() {
            warn!("failed to renew sockets: {}", error);
            return;
        }
        self.incoming_events.push(ServerEvent::ConnectionRenewed);
        self.set_state(ServerState::SendWorld);
    }

    fn send_started_replies(&mut self) {
        let guids = mem::take(&mut self.pending_replies);
        let mut commands = Vec::with_capacity(guids.len());
        for guid in guids {
            let Some(session_id) = self.roster.session_of(&guid) else {
                continue;
            };
            commands.push(Command::ClientStartedReply(ClientInfo {
                guid,
                session_id,
                roots: self.roots.clone(),
            }));
        }

        let mut frame = FrameWriter::with_header(NO_FRAME);
        frame.commands(&commands);
        self.send(frame);

        // a new display always gets a fresh full sync
        self.set_state(ServerState::SendWorld);
    }

    fn send_world(&mut self) {
        self.pending.mark_all(&self.tree);
        // the snapshot replaces the mirror, so pending deletes are moot
        self.deletes.clear();

        let mut frame = FrameWriter::with_header(NO_FRAME);
        frame.command(&Command::SendWorld);
        let node_count =
            WorldWriter::write_changes(&self.tree, &mut self.pending, &self.protocol.node_kinds, &mut frame);
        self.send(frame);
        info!("sent world of {} nodes", node_count);
        self.incoming_events
            .push(ServerEvent::WorldSent { node_count });

        self.frame = 0;
        self.set_state(ServerState::Running);
    }

    fn run_frame(&mut self) {
        let mut frame = FrameWriter::with_header(self.frame);
        let node_count =
            WorldWriter::write_changes(&self.tree, &mut self.pending, &self.protocol.node_kinds, &mut frame);
        let delete_count = WorldWriter::write_deletes(&mut self.deletes, &mut frame);
        if node_count > 0 || delete_count > 0 {
            debug!(
                "frame {}: {} nodes, {} deletes",
                self.frame, node_count, delete_count
            );
        }
        self.send(frame);

        self.receive_all();

        for change in self.roster.compare(self.frame) {
            let event = match change {
                RosterChange::Lagging {
                    session_id,
                    guid,
                    lag,
                } => ServerEvent::ClientLagging {
                    session_id,
                    guid,
                    lag,
                },
                RosterChange::Recovered { session_id, guid } => {
                    ServerEvent::ClientRecovered { session_id, guid }
                }
            };
            self.incoming_events.push(event);
        }

        self.frame = self.frame.checked_add(1).unwrap_or(0);
    }

    fn send(&mut self, frame: FrameWriter) {
        let bytes = frame.finish();
        if let Err(error) = self.io.send_frame(&bytes) {
            warn!("failed to send frame: {}", error);
        }
    }

    fn receive_all(&mut self) {
        let frames = self.io.receive_frames();
        if frames.is_empty() {
            return;
        }
        let decoded: Vec<DecodedFrame> = {
            let reader = FrameReader::new(&self.protocol.node_kinds);
            frames.iter().map(|bytes| reader.read(bytes)).collect()
        };

        let mut corrupted = false;
        for frame in decoded {
            for error in &frame.errors {
                warn!("inbound frame: {}", error);
            }
            corrupted |= frame.has_errors();
            corrupted |= !self.process_frame(frame.blobs);
        }

        // a damaged inbound stream forces every display to resync
        if corrupted && self.state == ServerState::Running {
            info!("inbound decode failure, resending the world");
            self.set_state(ServerState::SendWorld);
        }
    }

    // Returns false when a blob could not be applied
    fn process_frame(&mut self, blobs: Vec<Blob>) -> bool {
        let mut sender: Option<SessionId> = None;
        let mut intact = true;
        for blob in blobs {
            match blob {
                Blob::Command(command) => self.process_command(command, &mut sender),
                Blob::Node(node) => match sender {
                    Some(_) => intact &= self.process_node(&node),
                    None => warn!(
                        "ignoring data for node {} from a display without a session",
                        node.id
                    ),
                },
                Blob::Delete(ids) => {
                    warn!("ignoring delete of {} nodes sent by a display", ids.len());
                }
                Blob::Input(event) => {
                    self.incoming_events.push(ServerEvent::Input {
                        session_id: sender,
                        event,
                    });
                }
            }
        }
        intact
    }

    fn process_command(&mut self, command: Command, sender: &mut Option<SessionId>) {
        match command {
            Command::ClientStarted { guid } => {
                let session_id = self.roster.start_client(&guid);
                if session_id == NO_SESSION {
                    return;
                }
                self.incoming_events.push(ServerEvent::ClientStarted {
                    guid: guid.clone(),
                    session_id,
                });
                if !self.pending_replies.contains(&guid) {
                    self.pending_replies.push(guid);
                }
                self.set_state(ServerState::ClientStartedReply);
            }
            Command::RequestWorld => {
                if self.state == ServerState::Running {
                    self.set_state(ServerState::SendWorld);
                }
            }
            Command::ClientRunning { session_id, frame } => {
                if self.roster.reporting_in(session_id, frame) {
                    *sender = Some(session_id);
                } else {
                    debug!("heartbeat from unknown session {}", session_id);
                }
            }
            Command::SendWorld | Command::ClientStartedReply(_) => {
                warn!("display sent a server-only command {:?}", command.opcode());
            }
        }
    }

    // Display-originated data lands only on nodes that already exist with the
    // same kind, and is marked dirty again so every display converges on it
    fn process_node(&mut self, node: &NodeBlob) -> bool {
        match WorldReader::update_existing(&mut self.tree, &self.protocol.node_kinds, node) {
            Ok(true) => {
                let group_count = self.tree.group_count(node.id).unwrap_or(0);
                for group in node.mask.groups() {
                    if group < group_count {
                        self.pending.mark_dirty(node.id, group, group_count);
                    }
                }
                true
            }
            Ok(false) => {
                warn!(
                    "ignoring display data for node {} of kind {:?}",
                    node.id,
                    self.kind_name(node.tag)
                );
                true
            }
            Err(error) => {
                warn!("display data for node {} is corrupt: {}", node.id, error);
                false
            }
        }
    }

    fn kind_name(&self, tag: TypeTag) -> &'static str {
        self.protocol.node_kinds.name(tag).unwrap_or("unknown")
    }
}
