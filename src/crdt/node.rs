//! Node definition for the replicated sequence tree.
//!
//! This module contains the Node struct which represents one inserted
//! fragment in the tree, along with the arena slot type used to link nodes.

use crate::crdt::types::{NodeId, Side};

/// Position of a node inside the [`NodeStore`](crate::crdt::NodeStore) arena.
///
/// Slots are only meaningful for the store that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// The root sentinel always occupies the first slot.
    pub const ROOT: NodeIndex = NodeIndex(0);
}

/// Represents a single fragment within the tree.
///
/// Each node contains:
/// - A unique identifier that orders it among concurrent siblings
/// - The text fragment it contributes (one or more characters)
/// - Its attachment point: parent id and side
/// - A deletion flag that acts as a tombstone for logical deletion
/// - The ordered child lists on either side
///
/// # Tombstone Deletion
///
/// Nodes are never removed. Deleting sets `is_deleted`, which hides the
/// fragment from the text and from index resolution while keeping the node
/// available as an anchor for operations that still reference it.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier, also the sibling tie-break key
    pub id: NodeId,
    /// The text fragment of this node
    pub value: String,
    /// Id of the node this one hangs from; `None` only for the root
    pub parent: Option<NodeId>,
    /// Which child list of the parent holds this node; `None` only for the root
    pub side: Option<Side>,
    /// Whether this node has been logically deleted (tombstone)
    pub is_deleted: bool,
    pub(crate) left_children: Vec<NodeIndex>,
    pub(crate) right_children: Vec<NodeIndex>,
}

impl Node {
    /// Creates a new live node attached under `parent` on `side`.
    /// The node is not linked into the parent's child list yet.
    pub fn new(id: NodeId, value: impl Into<String>, parent: NodeId, side: Side) -> Self {
        Node {
            id,
            value: value.into(),
            parent: Some(parent),
            side: Some(side),
            is_deleted: false,
            left_children: Vec::new(),
            right_children: Vec::new(),
        }
    }

    /// Creates the root sentinel: empty value, no parent, never deleted.
    pub fn root() -> Self {
        Node {
            id: NodeId::root(),
            value: String::new(),
            parent: None,
            side: None,
            is_deleted: false,
            left_children: Vec::new(),
            right_children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns true if this node counts as a position (not deleted).
    ///
    /// The root is live forever, even though it contributes no text.
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    /// Marks this node as deleted (creates a tombstone).
    ///
    /// Returns false when the node was already a tombstone. The root cannot
    /// be deleted and is left untouched.
    pub fn delete(&mut self) -> bool {
        if self.is_root() || self.is_deleted {
            return false;
        }
        self.is_deleted = true;
        true
    }

    pub fn left_children(&self) -> &[NodeIndex] {
        &self.left_children
    }

    pub fn right_children(&self) -> &[NodeIndex] {
        &self.right_children
    }

    pub(crate) fn children(&self, side: Side) -> &[NodeIndex] {
        match side {
            Side::Left => &self.left_children,
            Side::Right => &self.right_children,
        }
    }

    pub(crate) fn children_mut(&mut self, side: Side) -> &mut Vec<NodeIndex> {
        match side {
            Side::Left => &mut self.left_children,
            Side::Right => &mut self.right_children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::types::SiteId;

    fn id(clock: u64) -> NodeId {
        NodeId::new(SiteId::new("site").unwrap(), clock)
    }

    #[test]
    fn test_node_creation() {
        let node = Node::new(id(1), "A", NodeId::root(), Side::Left);

        assert_eq!(node.id, id(1));
        assert_eq!(node.value, "A");
        assert_eq!(node.parent, Some(NodeId::root()));
        assert_eq!(node.side, Some(Side::Left));
        assert!(!node.is_deleted);
        assert!(node.left_children().is_empty());
        assert!(node.right_children().is_empty());
    }

    #[test]
    fn test_node_deletion_is_permanent() {
        let mut node = Node::new(id(1), "A", NodeId::root(), Side::Left);

        assert!(node.delete());
        assert!(node.is_deleted);
        assert!(!node.is_live());

        // Second delete is a no-op
        assert!(!node.delete());
        assert!(node.is_deleted);
    }

    #[test]
    fn test_root_node() {
        let mut root = Node::root();

        assert!(root.is_root());
        assert!(root.is_live());
        assert!(root.value.is_empty());

        // Cannot delete the root
        assert!(!root.delete());
        assert!(root.is_live());
    }
}
