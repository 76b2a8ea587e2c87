//! Tree traversal: in-order walk, index resolution and linearization.
//!
//! All walks use an explicit stack. Sequential typing builds chains whose
//! depth grows with the number of edits, so recursion is not an option.

use crate::crdt::node::{Node, NodeIndex};
use crate::crdt::store::NodeStore;
use crate::crdt::types::Side;

#[derive(Debug, Clone, Copy)]
enum Visit {
    Left,
    Own,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    slot: NodeIndex,
    visit: Visit,
}

/// In-order iterator over every node of a store, tombstones included.
///
/// Order: all left subtrees (in sibling order), the node itself, then all
/// right subtrees (in sibling order).
pub struct InOrder<'a> {
    store: &'a NodeStore,
    stack: Vec<Frame>,
}

impl<'a> InOrder<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        InOrder {
            store,
            stack: vec![Frame {
                slot: NodeIndex::ROOT,
                visit: Visit::Left,
            }],
        }
    }

    fn push_children(&mut self, children: &[NodeIndex]) {
        // Reversed so the first sibling is on top of the stack
        self.stack.extend(children.iter().rev().map(|&slot| Frame {
            slot,
            visit: Visit::Left,
        }));
    }
}

impl<'a> Iterator for InOrder<'a> {
    type Item = (NodeIndex, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let store = self.store;
            let frame = self.stack.last_mut()?;
            let slot = frame.slot;
            let node = store.get(slot);

            match frame.visit {
                Visit::Left => {
                    frame.visit = Visit::Own;
                    self.push_children(node.left_children());
                }
                Visit::Own => {
                    frame.visit = Visit::Right;
                    return Some((slot, node));
                }
                Visit::Right => {
                    self.stack.pop();
                    self.push_children(node.right_children());
                }
            }
        }
    }
}

/// Returns the `index`-th live node in document order.
///
/// The root is live and is counted, so with `n` live fragments the root
/// answers index `n`. Fragments count as one position regardless of length.
pub fn resolve_index(store: &NodeStore, index: usize) -> Option<NodeIndex> {
    InOrder::new(store)
        .filter(|(_, node)| node.is_live())
        .nth(index)
        .map(|(slot, _)| slot)
}

/// Concatenates the values of all live nodes in document order.
pub fn linearize(store: &NodeStore) -> String {
    InOrder::new(store)
        .filter(|(_, node)| node.is_live())
        .map(|(_, node)| node.value.as_str())
        .collect()
}

/// Number of live fragments, the root excluded.
pub fn live_count(store: &NodeStore) -> usize {
    InOrder::new(store)
        .filter(|(_, node)| node.is_live() && !node.is_root())
        .count()
}

/// Pre-order iterator yielding each node with its depth below the root.
///
/// Every node comes after its parent, so replaying nodes in this order
/// respects causal delivery.
pub struct PreOrder<'a> {
    store: &'a NodeStore,
    stack: Vec<(NodeIndex, usize)>,
}

impl<'a> PreOrder<'a> {
    pub fn new(store: &'a NodeStore) -> Self {
        PreOrder {
            store,
            stack: vec![(NodeIndex::ROOT, 0)],
        }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (slot, depth) = self.stack.pop()?;
        let node = self.store.get(slot);

        let children = node.left_children().iter().chain(node.right_children());
        let start = self.stack.len();
        self.stack.extend(children.map(|&child| (child, depth + 1)));
        self.stack[start..].reverse();

        Some((node, depth))
    }
}

/// Renders the tree one node per line, indented by depth.
///
/// Children are listed left side first, each line tagged with its side,
/// and tombstones are marked. Intended for debugging only.
pub fn outline(store: &NodeStore) -> String {
    let mut out = String::new();

    for (node, depth) in PreOrder::new(store) {
        let side = match node.side {
            Some(Side::Left) => "L ",
            Some(Side::Right) => "R ",
            None => "",
        };
        let status = if node.is_deleted { " (deleted)" } else { "" };

        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{side}{} {:?}{status}\n", node.id, node.value));
    }

    out
}
