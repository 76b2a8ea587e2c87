//! Core replicated sequence implementation.
//!
//! This module contains the [`Document`] struct: one replica of a text
//! document stored as an ordered tree. Local edits are addressed by index and
//! emitted as [`Operation`]s; remote operations are merged with
//! [`Document::apply`], which never fails.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::crdt::error::{DocumentError, MergeRejection};
use crate::crdt::node::Node;
use crate::crdt::operation::{DeleteOp, InsertOp, Operation};
use crate::crdt::pending::PendingOps;
use crate::crdt::store::NodeStore;
use crate::crdt::types::{LocalClock, MAX_CLOCK, NodeId, Side, SiteId};
use crate::crdt::walk::{self, InOrder, PreOrder};

/// Callback invoked synchronously after every local mutation.
pub type ChangeCallback = Box<dyn FnMut(TextAccessor<'_>, &Operation) + Send>;

/// A replica behind a lock, for callers that drive it from several tasks.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Lazy view of the document text handed to the change callback.
///
/// Building the text walks the whole tree, so the callback only pays for it
/// when it asks.
#[derive(Clone, Copy)]
pub struct TextAccessor<'a> {
    store: &'a NodeStore,
}

impl TextAccessor<'_> {
    pub fn text(&self) -> String {
        walk::linearize(self.store)
    }

    /// Number of live fragments.
    pub fn len(&self) -> usize {
        walk::live_count(self.store)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Construction options for a [`Document`].
pub struct DocumentConfig {
    site: String,
    on_local_change: Option<ChangeCallback>,
}

impl DocumentConfig {
    /// `site` must be unique among all replicas of the same document.
    pub fn new(site: impl Into<String>) -> Self {
        DocumentConfig {
            site: site.into(),
            on_local_change: None,
        }
    }

    pub fn on_local_change<F>(mut self, callback: F) -> Self
    where
        F: FnMut(TextAccessor<'_>, &Operation) + Send + 'static,
    {
        self.on_local_change = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Result<Document, DocumentError> {
        Document::with_config(self)
    }
}

/// Result of merging one remote operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The node was attached; `replayed` buffered operations were released by it.
    Inserted { id: NodeId, replayed: usize },
    /// The node became a tombstone.
    Deleted { id: NodeId },
    /// The operation had already been applied.
    Duplicate { id: NodeId },
    /// The operation waits in the pending buffer until `missing` arrives.
    Deferred { missing: NodeId },
    /// The payload is invalid and was dropped.
    Rejected(MergeRejection),
}

impl MergeOutcome {
    /// True when the operation changed the document.
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            MergeOutcome::Inserted { .. } | MergeOutcome::Deleted { .. }
        )
    }
}

/// One replica of a replicated text sequence.
///
/// # Design
///
/// - Nodes live in an arena; each keeps ordered left and right child lists
/// - In-order traversal of the tree is the document order
/// - Concurrent siblings are ordered by `(site, clock)`
/// - Deletion leaves a tombstone, nodes are never removed
/// - Remote operations whose dependency is missing wait in a pending buffer
pub struct Document {
    site: SiteId,
    clock: LocalClock,
    store: NodeStore,
    pending: PendingOps,
    on_local_change: Option<ChangeCallback>,
}

impl Document {
    /// Creates an empty replica without a change callback.
    pub fn new(site: impl Into<String>) -> Result<Self, DocumentError> {
        Self::with_config(DocumentConfig::new(site))
    }

    pub fn with_config(config: DocumentConfig) -> Result<Self, DocumentError> {
        let site = SiteId::new(&config.site)?;
        debug!(%site, "created document replica");

        Ok(Document {
            site,
            clock: LocalClock::new(),
            store: NodeStore::new(),
            pending: PendingOps::new(),
            on_local_change: config.on_local_change,
        })
    }

    /// Replaces the change callback.
    pub fn set_on_local_change<F>(&mut self, callback: F)
    where
        F: FnMut(TextAccessor<'_>, &Operation) + Send + 'static,
    {
        self.on_local_change = Some(Box::new(callback));
    }

    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Clock value the next local insert will use.
    pub fn current_clock(&self) -> u64 {
        self.clock.current()
    }

    /// Inserts `content` as one fragment at `index`.
    ///
    /// `index` is a fragment position in `[0, len]`. A multi-character
    /// `content` becomes a single node and later occupies a single index.
    ///
    /// # Returns
    ///
    /// * `Ok(NodeId)` - The id of the new node
    /// * `Err(DocumentError)` - If the index is out of range or `content` is empty
    pub fn insert(
        &mut self,
        index: usize,
        content: impl Into<String>,
    ) -> Result<NodeId, DocumentError> {
        let value = content.into();
        if value.is_empty() {
            return Err(DocumentError::EmptyContent);
        }
        let len = self.len();
        if index > len {
            return Err(DocumentError::IndexOutOfRange { index, len });
        }

        let left = index
            .checked_sub(1)
            .and_then(|i| walk::resolve_index(&self.store, i));

        // Hang off the right of the left neighbour while that slot is free,
        // otherwise off the left of the right neighbour. The root answers
        // index `len`, so a right neighbour always exists.
        let (parent, side) = match left {
            Some(left) if self.store.get(left).right_children().is_empty() => (left, Side::Right),
            _ => {
                let right = walk::resolve_index(&self.store, index)
                    .ok_or(DocumentError::NoAnchor { index })?;
                (right, Side::Left)
            }
        };

        let clock = self
            .clock
            .tick()
            .map_err(|_| DocumentError::ClockExhausted {
                site: self.site.clone(),
            })?;
        let id = NodeId::new(self.site.clone(), clock);
        let parent_id = self.store.get(parent).id.clone();
        let node = Node::new(id.clone(), value.clone(), parent_id.clone(), side);
        let slot = self
            .store
            .create(node)
            .ok_or_else(|| DocumentError::DuplicateId(id.clone()))?;
        self.store.attach(slot);

        trace!(site = %self.site, %id, index, ?side, parent = %parent_id, "local insert");
        self.emit(&Operation::Insert(InsertOp {
            id: id.clone(),
            parent: Some(parent_id),
            value,
            side: Some(side),
        }));
        self.replay(&id);

        Ok(id)
    }

    /// Deletes the fragment at `index`, which must be in `[0, len)`.
    ///
    /// The index is resolved against the current visible sequence, so
    /// repeated deletes at one index remove successive fragments.
    pub fn delete(&mut self, index: usize) -> Result<NodeId, DocumentError> {
        let len = self.len();
        if index >= len {
            return Err(DocumentError::IndexOutOfRange { index, len });
        }

        let slot = walk::resolve_index(&self.store, index)
            .ok_or(DocumentError::IndexOutOfRange { index, len })?;
        let node = self.store.get_mut(slot);
        if !node.delete() {
            return Err(DocumentError::IndexOutOfRange { index, len });
        }
        let id = node.id.clone();

        trace!(site = %self.site, %id, index, "local delete");
        self.emit(&Operation::Delete(DeleteOp { id: id.clone() }));

        Ok(id)
    }

    /// Merges an operation received from another replica.
    ///
    /// Never fails: duplicates are absorbed, operations whose parent or
    /// target is unknown are buffered and replayed once it arrives, and
    /// invalid payloads are dropped with a warning.
    pub fn apply(&mut self, op: Operation) -> MergeOutcome {
        match self.integrate(op) {
            MergeOutcome::Inserted { id, .. } => {
                let replayed = self.replay(&id);
                MergeOutcome::Inserted { id, replayed }
            }
            outcome => outcome,
        }
    }

    /// Decodes a wire operation and merges it.
    ///
    /// Malformed input is reported as [`MergeRejection::Malformed`].
    pub fn apply_json(&mut self, json: &str) -> MergeOutcome {
        match Operation::from_json(json) {
            Ok(op) => self.apply(op),
            Err(e) => {
                warn!(site = %self.site, error = %e, "dropping malformed operation");
                MergeOutcome::Rejected(MergeRejection::Malformed(e.to_string()))
            }
        }
    }

    /// Returns the current visible text.
    pub fn text(&self) -> String {
        walk::linearize(&self.store)
    }

    /// Number of live fragments (equal to the character count while every
    /// fragment holds one character).
    pub fn len(&self) -> usize {
        walk::live_count(&self.store)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored nodes, including the root and tombstones.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    /// Number of remote operations waiting for a dependency.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Ids that buffered operations are waiting for.
    pub fn missing_ids(&self) -> Vec<NodeId> {
        self.pending.missing().cloned().collect()
    }

    /// Node at a live position; index `len()` resolves to the root.
    pub fn resolve_index(&self, index: usize) -> Option<&Node> {
        walk::resolve_index(&self.store, index).map(|slot| self.store.get(slot))
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.store.lookup(id).map(|slot| self.store.get(slot))
    }

    /// All nodes in document order, tombstones and the root included.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        InOrder::new(&self.store).map(|(_, node)| node)
    }

    /// Live fragments in document order.
    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes().filter(|node| node.is_live() && !node.is_root())
    }

    /// Operations that rebuild this replica's state on an empty replica.
    ///
    /// Inserts come parents first, followed by deletes for every tombstone.
    pub fn operations(&self) -> Vec<Operation> {
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();

        for (node, _) in PreOrder::new(&self.store).filter(|(node, _)| !node.is_root()) {
            inserts.push(Operation::Insert(InsertOp {
                id: node.id.clone(),
                parent: node.parent.clone(),
                value: node.value.clone(),
                side: node.side,
            }));
            if node.is_deleted {
                deletes.push(Operation::Delete(DeleteOp {
                    id: node.id.clone(),
                }));
            }
        }

        inserts.extend(deletes);
        inserts
    }

    /// Indented rendering of the tree, for debugging.
    pub fn dump_tree(&self) -> String {
        walk::outline(&self.store)
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    fn emit(&mut self, op: &Operation) {
        let Document {
            store,
            on_local_change,
            ..
        } = self;
        if let Some(callback) = on_local_change.as_mut() {
            callback(TextAccessor { store: &*store }, op);
        }
    }

    /// Releases operations waiting on `id`, and transitively on whatever
    /// they insert.
    fn replay(&mut self, id: &NodeId) -> usize {
        let mut ready = vec![id.clone()];
        let mut replayed = 0;

        while let Some(id) = ready.pop() {
            for op in self.pending.release(&id) {
                replayed += 1;
                if let MergeOutcome::Inserted { id, .. } = self.integrate(op) {
                    ready.push(id);
                }
            }
        }

        if replayed > 0 {
            debug!(site = %self.site, trigger = %id, replayed, "replayed buffered operations");
        }
        replayed
    }

    /// Advances the clock past `id` if this site minted it.
    fn observe_own(&mut self, id: &NodeId) {
        if id.site == self.site {
            self.clock.observe(id.clock);
        }
    }

    fn integrate(&mut self, op: Operation) -> MergeOutcome {
        let outcome = match op {
            Operation::Insert(insert) => self.integrate_insert(insert),
            Operation::Delete(delete) => self.integrate_delete(delete),
        };

        match &outcome {
            MergeOutcome::Rejected(reason) => {
                warn!(site = %self.site, %reason, "rejected remote operation");
            }
            MergeOutcome::Deferred { missing } => {
                debug!(site = %self.site, %missing, pending = self.pending.len(), "deferred remote operation");
            }
            MergeOutcome::Duplicate { id } => {
                debug!(site = %self.site, %id, "ignored duplicate operation");
            }
            MergeOutcome::Inserted { id, .. } => trace!(site = %self.site, %id, "merged insert"),
            MergeOutcome::Deleted { id } => trace!(site = %self.site, %id, "merged delete"),
        }
        outcome
    }

    fn integrate_insert(&mut self, op: InsertOp) -> MergeOutcome {
        if op.id.is_reserved() {
            return MergeOutcome::Rejected(MergeRejection::ReservedId(op.id));
        }
        if op.id.clock > MAX_CLOCK {
            return MergeOutcome::Rejected(MergeRejection::ClockOutOfRange(op.id));
        }
        if op.value.is_empty() {
            return MergeOutcome::Rejected(MergeRejection::EmptyValue(op.id));
        }
        if let Some(existing) = self.node(&op.id) {
            if existing.value != op.value || existing.parent != op.parent || existing.side != op.side {
                warn!(site = %self.site, id = %op.id, "duplicate insert carries a different payload, keeping the first");
            }
            return MergeOutcome::Duplicate { id: op.id };
        }

        let (Some(parent), Some(side)) = (op.parent.clone(), op.side) else {
            return MergeOutcome::Rejected(MergeRejection::MissingAnchor(op.id));
        };
        if parent == op.id {
            return MergeOutcome::Rejected(MergeRejection::MissingAnchor(op.id));
        }
        if parent.is_root() && side == Side::Right {
            return MergeOutcome::Rejected(MergeRejection::RootRightChild(op.id));
        }
        if parent.is_reserved() && !parent.is_root() {
            return MergeOutcome::Rejected(MergeRejection::ReservedId(parent));
        }
        if parent.clock > MAX_CLOCK {
            return MergeOutcome::Rejected(MergeRejection::ClockOutOfRange(parent));
        }

        // Before deferring, so a buffered id is never minted locally
        self.observe_own(&op.id);
        self.observe_own(&parent);

        if !self.store.contains(&parent) {
            self.pending.defer(parent.clone(), Operation::Insert(op));
            return MergeOutcome::Deferred { missing: parent };
        }

        let id = op.id.clone();
        let Some(slot) = self.store.create(Node::new(op.id, op.value, parent, side)) else {
            return MergeOutcome::Duplicate { id };
        };
        self.store.attach(slot);
        MergeOutcome::Inserted { id, replayed: 0 }
    }

    fn integrate_delete(&mut self, op: DeleteOp) -> MergeOutcome {
        if op.id.is_root() {
            return MergeOutcome::Rejected(MergeRejection::RootDelete);
        }
        if op.id.is_reserved() {
            return MergeOutcome::Rejected(MergeRejection::ReservedId(op.id));
        }
        if op.id.clock > MAX_CLOCK {
            return MergeOutcome::Rejected(MergeRejection::ClockOutOfRange(op.id));
        }
        self.observe_own(&op.id);

        match self.store.lookup(&op.id) {
            Some(slot) => {
                if self.store.get_mut(slot).delete() {
                    MergeOutcome::Deleted { id: op.id }
                } else {
                    MergeOutcome::Duplicate { id: op.id }
                }
            }
            None => {
                let missing = op.id.clone();
                self.pending.defer(missing.clone(), Operation::Delete(op));
                MergeOutcome::Deferred { missing }
            }
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("site", &self.site)
            .field("clock", &self.clock.current())
            .field("nodes", &self.store.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
