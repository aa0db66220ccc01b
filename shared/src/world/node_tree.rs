use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use log::{debug, warn};

use lumen_serde::{ByteReader, ByteWrite, ByteWriter, ConstByteLength, Serde, SerdeErr};

use crate::{
    types::HostType,
    DiffMask,
    world::node::{
        changes::Changes,
        error::TreeError,
        node_kinds::TypeTag,
        replicate::{NodeKind, Replicate},
    },
};

/// Process-unique id of a node. Allocated by the authoring side from a counter
/// starting at 1 and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl Serde for NodeId {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        self.0.ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self(u32::de(reader)?))
    }

    fn byte_length(&self) -> usize {
        <Self as ConstByteLength>::const_byte_length()
    }
}

impl ConstByteLength for NodeId {
    fn const_byte_length() -> usize {
        4
    }
}

/// What a collaborator sees when walking the tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub tag: TypeTag,
}

struct NodeEntry {
    parent: Option<NodeId>,
    tag: TypeTag,
    replica: Box<dyn Replicate>,
}

/// The replicated scene graph. On the server it is the authoritative tree; on
/// a client it is the mirror rebuilt from node blobs.
pub struct NodeTree {
    host_type: HostType,
    next_id: u32,
    nodes: BTreeMap<NodeId, NodeEntry>,
}

impl NodeTree {
    pub fn new(host_type: HostType) -> Self {
        Self {
            host_type,
            next_id: 1,
            nodes: BTreeMap::new(),
        }
    }

    pub fn host_type(&self) -> HostType {
        self.host_type
    }

    /// Adds a node under `parent` (or as a root) and returns its new id
    pub fn insert(
        &mut self,
        parent: Option<NodeId>,
        replica: Box<dyn Replicate>,
    ) -> Result<NodeId, TreeError> {
        if self.host_type == HostType::Client {
            return Err(TreeError::CannotAllocate);
        }
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(TreeError::NodeNotFound { id: parent_id });
            }
        }
        let next = self.next_id.checked_add(1).ok_or(TreeError::IdsExhausted)?;
        let id = NodeId(self.next_id);
        self.next_id = next;

        let tag = TypeTag::from_name(replica.kind_name());
        self.nodes.insert(
            id,
            NodeEntry {
                parent,
                tag,
                replica,
            },
        );
        Ok(id)
    }

    pub fn insert_kind<K: NodeKind>(
        &mut self,
        parent: Option<NodeId>,
        node: K,
    ) -> Result<NodeId, TreeError> {
        self.insert(parent, Box::new(node))
    }

    /// Mutates a node of a known kind. The closure reports which groups it
    /// touched; the returned `Changes` is what the sync layer should record.
    /// A report naming a group the kind does not have is rejected and the
    /// node is restored to its value from before the call.
    pub fn mutate<K: NodeKind, F: FnOnce(&mut K) -> Changes>(
        &mut self,
        id: NodeId,
        mutator: F,
    ) -> Result<Changes, TreeError> {
        let entry = self
            .nodes
            .get_mut(&id)
            .ok_or(TreeError::NodeNotFound { id })?;
        let actual = entry.replica.kind_name();
        let group_count = entry.replica.group_count();
        let Some(node) = entry.replica.as_any_mut().downcast_mut::<K>() else {
            return Err(TreeError::WrongKind {
                id,
                expected: K::NAME,
                actual,
            });
        };

        let full = DiffMask::full(group_count);
        let mut snapshot = ByteWriter::new();
        node.write_groups(&full, &mut snapshot);

        let changes = mutator(node);
        let Some(group) = changes.groups().iter().copied().find(|group| *group >= group_count)
        else {
            return Ok(changes);
        };

        let bytes = snapshot.to_bytes();
        if node.read_groups(&full, &mut ByteReader::new(&bytes)).is_err() {
            warn!("could not restore node {} after a bad mutation", id);
        }
        Err(TreeError::GroupOutOfRange {
            id,
            group,
            group_count,
        })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&dyn Replicate> {
        self.nodes.get(&id).map(|entry| entry.replica.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut (dyn Replicate + 'static)> {
        self.nodes.get_mut(&id).map(|entry| entry.replica.as_mut())
    }

    pub fn get_as<K: NodeKind>(&self, id: NodeId) -> Option<&K> {
        self.get(id)?.as_any().downcast_ref::<K>()
    }

    pub fn record(&self, id: NodeId) -> Option<NodeRecord> {
        self.nodes.get(&id).map(|entry| NodeRecord {
            id,
            parent: entry.parent,
            tag: entry.tag,
        })
    }

    pub fn tag(&self, id: NodeId) -> Option<TypeTag> {
        self.nodes.get(&id).map(|entry| entry.tag)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|entry| entry.parent)
    }

    pub fn group_count(&self, id: NodeId) -> Option<u8> {
        self.nodes.get(&id).map(|entry| entry.replica.group_count())
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Direct children of a node, in id order
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(child, entry)| entry.parent == Some(id) && **child != id)
            .map(|(child, _)| *child)
            .collect()
    }

    /// Every node, parents before their children. Siblings come in id order.
    pub fn enumerate(&self) -> Vec<NodeRecord> {
        let (roots, children) = self.child_map();
        let mut visited = HashSet::with_capacity(self.nodes.len());
        let mut output = Vec::with_capacity(self.nodes.len());

        for root in roots {
            self.walk(root, &children, &mut visited, &mut output);
        }
        // a corrupt mirror can hold parent cycles that no root reaches
        for id in self.nodes.keys() {
            if !visited.contains(id) {
                self.walk(*id, &children, &mut visited, &mut output);
            }
        }

        output
            .into_iter()
            .filter_map(|id| self.record(id))
            .collect()
    }

    /// Removes a node and its whole subtree, returning every removed id with
    /// parents first
    pub fn delete(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NodeNotFound { id });
        }
        let (_, children) = self.child_map();
        let mut visited = HashSet::new();
        let mut removed = Vec::new();
        self.walk(id, &children, &mut visited, &mut removed);

        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        Ok(removed)
    }

    /// Removes a node as instructed by the peer. Unknown ids are not an
    /// error; the node may never have reached this side.
    pub fn delete_node(&mut self, id: NodeId) -> Vec<NodeId> {
        match self.delete(id) {
            Ok(removed) => removed,
            Err(_) => {
                debug!("delete of unknown node {}", id);
                Vec::new()
            }
        }
    }

    /// Stores a node decoded from the wire under the peer's id, replacing
    /// whatever held that id before
    pub fn apply_decoded_node(
        &mut self,
        id: NodeId,
        parent: Option<NodeId>,
        replica: Box<dyn Replicate>,
    ) -> Option<Box<dyn Replicate>> {
        let tag = TypeTag::from_name(replica.kind_name());
        let previous = self.nodes.insert(
            id,
            NodeEntry {
                parent,
                tag,
                replica,
            },
        );
        previous.map(|entry| entry.replica)
    }

    /// Moves a node under a new parent
    pub fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) -> Result<(), TreeError> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(TreeError::NodeNotFound { id: parent_id });
            }
        }
        let entry = self
            .nodes
            .get_mut(&id)
            .ok_or(TreeError::NodeNotFound { id })?;
        entry.parent = parent;
        Ok(())
    }

    /// Sets a mirrored node's parent as the peer reports it, whether or not
    /// that parent has arrived yet
    pub fn relink(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(entry) = self.nodes.get_mut(&id) {
            entry.parent = parent;
        }
    }

    /// Drops every node. Id allocation continues where it left off.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    // roots are nodes without a parent, or whose parent is not (yet) here
    fn child_map(&self) -> (Vec<NodeId>, HashMap<NodeId, Vec<NodeId>>) {
        let mut roots = Vec::new();
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for (id, entry) in &self.nodes {
            match entry.parent {
                Some(parent) if parent != *id && self.nodes.contains_key(&parent) => {
                    children.entry(parent).or_default().push(*id);
                }
                _ => roots.push(*id),
            }
        }
        (roots, children)
    }

    fn walk(
        &self,
        start: NodeId,
        children: &HashMap<NodeId, Vec<NodeId>>,
        visited: &mut HashSet<NodeId>,
        output: &mut Vec<NodeId>,
    ) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            output.push(id);
            if let Some(kids) = children.get(&id) {
                stack.extend(kids.iter().rev());
            }
        }
    }
}
