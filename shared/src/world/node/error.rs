use thiserror::Error;

use super::node_kinds::TypeTag;
use crate::world::node_tree::NodeId;

/// Errors that can occur while registering node kinds
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The same kind name was registered twice
    #[error("Node kind '{name}' is already registered")]
    AlreadyRegistered { name: &'static str },

    /// Two different kind names hash to the same type tag
    #[error("Node kind '{new}' hashes to tag {tag:?}, already taken by '{existing}'. Rename one of the kinds")]
    TagCollision {
        tag: TypeTag,
        existing: &'static str,
        new: &'static str,
    },

    /// The kind name hashes to the reserved tag 0
    #[error("Node kind '{name}' hashes to the reserved tag 0. Rename the kind")]
    ReservedTag { name: &'static str },

    /// The builder produced a node whose kind name differs from the registered name
    #[error("Builder registered as '{registered}' produced a node of kind '{built}'")]
    BuilderMismatch {
        registered: &'static str,
        built: &'static str,
    },
}

/// Errors that can occur while changing a node tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Only the authoring side allocates node ids; a mirror receives them
    #[error("A client-side mirror tree cannot allocate node ids")]
    CannotAllocate,

    /// Every u32 node id has been handed out
    #[error("Node ids exhausted")]
    IdsExhausted,

    /// No node with this id exists in the tree
    #[error("Node {id} does not exist")]
    NodeNotFound { id: NodeId },

    /// The node exists but is of another kind than the one asked for
    #[error("Node {id} is of kind '{actual}', not '{expected}'")]
    WrongKind {
        id: NodeId,
        expected: &'static str,
        actual: &'static str,
    },

    /// The node's kind was never registered with the protocol
    #[error("Node kind '{name}' is not registered with the Protocol. Call `add_kind()` during protocol initialization")]
    KindNotRegistered { name: &'static str },

    /// The attribute group is past the end of the node's kind
    #[error("Group {group} is out of range for node {id}, which has {group_count} groups")]
    GroupOutOfRange {
        id: NodeId,
        group: u8,
        group_count: u8,
    },
}
