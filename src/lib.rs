//! # Replicated text sequence
//!
//! A Conflict-free Replicated Data Type (CRDT) for collaborative text editing.
//! Each replica stores the document as an ordered tree; local edits are
//! addressed by index and turned into small self-describing operations that
//! other replicas merge in any order.
//!
//! ## Features
//!
//! - **Conflict-free**: replicas that applied the same operations read the same text
//! - **Order-tolerant**: operations arriving before their dependency are buffered
//! - **Idempotent**: duplicate operations are absorbed
//! - **Tombstone-based deletion**: deleted fragments stay in the tree as anchors
//! - **Relay**: a websocket server and client to exchange operations
//!
//! ## Example
//!
//! ```rust
//! use crdt_seq::Document;
//!
//! let mut alice = Document::new("alice").unwrap();
//! let mut bob = Document::new("bob").unwrap();
//!
//! alice.insert(0, "h").unwrap();
//! alice.insert(1, "i").unwrap();
//!
//! for op in alice.operations() {
//!     bob.apply(op);
//! }
//! assert_eq!(bob.text(), "hi");
//! ```

pub mod crdt;
pub mod peer;
pub mod server;

// Re-export the main public API from the CRDT module
pub use crdt::{
    Document, DocumentConfig, DocumentError, MergeOutcome, MergeRejection, Node, NodeId,
    Operation, SharedDocument, Side, SiteId, TextAccessor,
};
pub use peer::{Peer, PeerError};
