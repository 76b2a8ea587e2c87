//! CRDT (Conflict-free Replicated Data Type) implementation module.
//!
//! This module contains the tree-based replicated sequence and all its
//! supporting types: node storage, traversal, the wire operations and the
//! pending buffer used when operations arrive out of causal order.

pub mod document;
pub mod error;
pub mod node;
pub mod operation;
pub mod pending;
pub mod store;
pub mod types;
pub mod walk;

// Re-export the main public API
pub use document::{
    ChangeCallback, Document, DocumentConfig, MergeOutcome, SharedDocument, TextAccessor,
};
pub use error::{ClockExhausted, DocumentError, IdError, MergeRejection};
pub use node::{Node, NodeIndex};
pub use operation::{DeleteOp, InsertOp, Operation};
pub use store::NodeStore;
pub use types::{LocalClock, MAX_CLOCK, NodeId, Side, SiteId};
