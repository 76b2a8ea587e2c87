//! Buffer for remote operations that arrived before their dependency.
//!
//! An insert waits for its parent, a delete waits for its target. Both are
//! keyed by the missing id and released once a node with that id is attached.

use std::collections::HashMap;

use crate::crdt::operation::Operation;
use crate::crdt::types::NodeId;

#[derive(Debug, Clone, Default)]
pub struct PendingOps {
    waiting: HashMap<NodeId, Vec<Operation>>,
    len: usize,
}

impl PendingOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks `op` until `missing` shows up. Returns false if an identical
    /// operation is already parked under the same id.
    pub fn defer(&mut self, missing: NodeId, op: Operation) -> bool {
        let queue = self.waiting.entry(missing).or_default();
        if queue.contains(&op) {
            return false;
        }
        queue.push(op);
        self.len += 1;
        true
    }

    /// Removes and returns every operation waiting on `id`, oldest first.
    pub fn release(&mut self, id: &NodeId) -> Vec<Operation> {
        let released = self.waiting.remove(id).unwrap_or_default();
        self.len -= released.len();
        released
    }

    /// Number of parked operations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Ids that parked operations are waiting for.
    pub fn missing(&self) -> impl Iterator<Item = &NodeId> {
        self.waiting.keys()
    }
}
