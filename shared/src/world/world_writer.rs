use log::warn;

use crate::{
    frame::frame_writer::FrameWriter,
    world::{
        delete_list::DeleteList, node::node_kinds::NodeKinds, node_tree::NodeTree,
        pending_changes::PendingChanges,
    },
};

/// Turns outstanding changes into node and delete blobs
pub struct WorldWriter;

impl WorldWriter {
    /// Writes one node blob per dirty node, parents before children, holding
    /// only the dirty groups. Returns how many node blobs were written.
    ///
    /// Masks are cleared as soon as their blob is encoded, before anything
    /// is known about delivery. A lost datagram loses that delta until the
    /// node changes again or a full resync runs.
    pub fn write_changes(
        tree: &NodeTree,
        pending: &mut PendingChanges,
        kinds: &NodeKinds,
        frame: &mut FrameWriter,
    ) -> usize {
        if pending.is_empty() {
            return 0;
        }

        let mut written = 0;
        for record in tree.enumerate() {
            let Some(mask) = pending.take(record.id) else {
                continue;
            };
            if mask.is_clear() {
                continue;
            }
            if !kinds.contains(record.tag) {
                warn!(
                    "node {} has unregistered type tag {:?}, not sent",
                    record.id, record.tag
                );
                continue;
            }
            let Some(replica) = tree.get(record.id) else {
                continue;
            };
            frame.node(record.id, record.parent, record.tag, &mask, replica);
            written += 1;
        }

        // whatever is left belongs to nodes that are gone
        pending.clear();
        written
    }

    /// Flushes the delete list as a single delete blob
    pub fn write_deletes(deletes: &mut DeleteList, frame: &mut FrameWriter) -> usize {
        let ids = deletes.take();
        frame.delete(&ids);
        ids.len()
    }
}
