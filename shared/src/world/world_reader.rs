use log::debug;

use lumen_serde::ByteReader;

use crate::{
    frame::{
        blob::{BlobKind, NodeBlob},
        error::DecodeError,
    },
    world::{
        node::{node_kinds::NodeKinds, replicate::Replicate},
        node_tree::{NodeId, NodeTree},
    },
};

/// Applies decoded node and delete blobs to a tree
pub struct WorldReader;

impl WorldReader {
    /// Creates or updates the node a blob describes. An existing node of the
    /// same kind is updated in place; anything else under that id is replaced
    /// by a fresh node built from the registry.
    pub fn apply(
        tree: &mut NodeTree,
        kinds: &NodeKinds,
        blob: &NodeBlob,
    ) -> Result<NodeId, DecodeError> {
        if !Self::update_existing(tree, kinds, blob)? {
            let mut replica = Self::build(kinds, blob)?;
            Self::decode_into(replica.as_mut(), blob)?;

            if tree.apply_decoded_node(blob.id, blob.parent, replica).is_some() {
                debug!("node {} replaced by a node of another kind", blob.id);
            }
        }
        Ok(blob.id)
    }

    /// Updates a node only if it already exists with the blob's kind. Returns
    /// whether it was applied. A blob that fails to decode leaves the node as
    /// it was.
    pub fn update_existing(
        tree: &mut NodeTree,
        kinds: &NodeKinds,
        blob: &NodeBlob,
    ) -> Result<bool, DecodeError> {
        if tree.tag(blob.id) != Some(blob.tag) {
            return Ok(false);
        }
        // decoded into a blank first so a bad payload never reaches the tree
        let mut scratch = Self::build(kinds, blob)?;
        Self::decode_into(scratch.as_mut(), blob)?;

        let Some(replica) = tree.get_mut(blob.id) else {
            return Ok(false);
        };
        Self::decode_into(replica, blob)?;

        if tree.parent(blob.id) != blob.parent {
            tree.relink(blob.id, blob.parent);
        }
        Ok(true)
    }

    /// Removes every listed node with its subtree, returning the removed ids
    pub fn apply_deletes(tree: &mut NodeTree, ids: &[NodeId]) -> Vec<NodeId> {
        let mut removed = Vec::new();
        for id in ids {
            removed.extend(tree.delete_node(*id));
        }
        removed
    }

    fn build(kinds: &NodeKinds, blob: &NodeBlob) -> Result<Box<dyn Replicate>, DecodeError> {
        kinds
            .build(blob.tag)
            .ok_or(DecodeError::UnknownTypeTag { tag: blob.tag })
    }

    // a kind's reader must stop exactly at the end of what its writer wrote
    fn decode_into(replica: &mut dyn Replicate, blob: &NodeBlob) -> Result<(), DecodeError> {
        let mut reader = ByteReader::new(&blob.payload);
        replica.read_groups(&blob.mask, &mut reader)?;
        if reader.is_empty() {
            Ok(())
        } else {
            Err(DecodeError::MissingTerminator {
                kind: BlobKind::Node,
            })
        }
    }
}
