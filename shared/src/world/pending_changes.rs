use std::collections::HashMap;

use crate::world::{
    node::{changes::Changes, diff_mask::DiffMask},
    node_tree::{NodeId, NodeTree},
};

/// Outstanding dirty groups per node, owned by the sync layer. Mutators hand
/// their `Changes` in here; the world writer takes them out when it flushes.
#[derive(Default)]
pub struct PendingChanges {
    masks: HashMap<NodeId, DiffMask>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a mutation's changes into the node's pending mask
    pub fn record(&mut self, id: NodeId, changes: &Changes, group_count: u8) {
        if changes.is_empty() {
            return;
        }
        let mask = self
            .masks
            .entry(id)
            .or_insert_with(|| DiffMask::new(group_count));
        for group in changes.groups() {
            mask.set_bit(*group, true);
        }
    }

    pub fn mark_dirty(&mut self, id: NodeId, group: u8, group_count: u8) {
        self.record(id, &Changes::group(group), group_count);
    }

    /// Marks every group of one node, as for a freshly inserted node
    pub fn mark_node(&mut self, id: NodeId, group_count: u8) {
        self.masks
            .entry(id)
            .or_insert_with(|| DiffMask::new(group_count))
            .or(&DiffMask::full(group_count));
    }

    /// Full resync: every live node becomes fully dirty
    pub fn mark_all(&mut self, tree: &NodeTree) {
        for id in tree.ids() {
            if let Some(group_count) = tree.group_count(id) {
                self.mark_node(id, group_count);
            }
        }
    }

    /// Removes and returns a node's mask
    pub fn take(&mut self, id: NodeId) -> Option<DiffMask> {
        self.masks.remove(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&DiffMask> {
        self.masks.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.masks.get(&id).is_some_and(|mask| !mask.is_clear())
    }

    pub fn remove(&mut self, id: NodeId) {
        self.masks.remove(&id);
    }

    pub fn clear(&mut self) {
        self.masks.clear();
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}
