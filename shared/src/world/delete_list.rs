use std::collections::HashSet;

use crate::world::node_tree::NodeId;

/// Node ids pending removal on the peers, in the order they were deleted.
/// Flushed as one delete blob per tick.
#[derive(Default)]
pub struct DeleteList {
    order: Vec<NodeId>,
    members: HashSet<NodeId>,
}

impl DeleteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: NodeId) {
        if self.members.insert(id) {
            self.order.push(id);
        }
    }

    pub fn extend<I: IntoIterator<Item = NodeId>>(&mut self, ids: I) {
        for id in ids {
            self.push(id);
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Empties the list, returning ids in deletion order
    pub fn take(&mut self) -> Vec<NodeId> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
