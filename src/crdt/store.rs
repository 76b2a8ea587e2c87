//! Arena storage for tree nodes and deterministic sibling ordering.
//!
//! Nodes live in a `Vec` and refer to each other by [`NodeIndex`]; an id
//! index maps wire ids to slots. Nothing is ever removed, so slots stay
//! valid for the lifetime of the store.

use std::collections::HashMap;

use crate::crdt::node::{Node, NodeIndex};
use crate::crdt::types::{NodeId, Side};

/// Owns every node of one replica, the root included.
#[derive(Debug, Clone)]
pub struct NodeStore {
    nodes: Vec<Node>,
    index: HashMap<NodeId, NodeIndex>,
}

impl NodeStore {
    /// Creates a store holding only the root sentinel.
    pub fn new() -> Self {
        let root = Node::root();
        let mut index = HashMap::new();
        index.insert(root.id.clone(), NodeIndex::ROOT);

        NodeStore {
            nodes: vec![root],
            index,
        }
    }

    /// Registers a node without linking it into the tree.
    ///
    /// Returns `None` if a node with the same id already exists; the store
    /// is left unchanged in that case.
    pub fn create(&mut self, node: Node) -> Option<NodeIndex> {
        if self.index.contains_key(&node.id) {
            return None;
        }
        let slot = NodeIndex(self.nodes.len());
        self.index.insert(node.id.clone(), slot);
        self.nodes.push(node);
        Some(slot)
    }

    /// Links a registered node into its parent's child list.
    ///
    /// The node is inserted immediately before the first sibling with a
    /// greater id, keeping each child list sorted ascending. Returns false
    /// (and does nothing) if the node has no parent/side or the parent is
    /// not in the store.
    pub fn attach(&mut self, slot: NodeIndex) -> bool {
        let node = &self.nodes[slot.0];
        let (Some(parent_id), Some(side)) = (node.parent.as_ref(), node.side) else {
            return false;
        };
        let Some(&parent) = self.index.get(parent_id) else {
            return false;
        };

        let position = self.sibling_position(parent, side, &node.id);
        self.nodes[parent.0].children_mut(side).insert(position, slot);
        true
    }

    /// Index in `parent`'s `side` list where a node with `id` belongs.
    fn sibling_position(&self, parent: NodeIndex, side: Side, id: &NodeId) -> usize {
        self.nodes[parent.0]
            .children(side)
            .partition_point(|sibling| self.nodes[sibling.0].id < *id)
    }

    pub fn get(&self, slot: NodeIndex) -> &Node {
        &self.nodes[slot.0]
    }

    pub(crate) fn get_mut(&mut self, slot: NodeIndex) -> &mut Node {
        &mut self.nodes[slot.0]
    }

    pub fn lookup(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn root(&self) -> &Node {
        &self.nodes[NodeIndex::ROOT.0]
    }

    /// Total node count, including the root and tombstones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A store is never empty: the root is always present.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}
