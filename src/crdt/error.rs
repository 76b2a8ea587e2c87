//! Error types for the replicated sequence.
//!
//! Local API calls fail with [`DocumentError`]. Remote operations never fail:
//! they resolve to a [`MergeOutcome`](crate::crdt::MergeOutcome), and a refused
//! payload carries a [`MergeRejection`] explaining why.

use thiserror::Error;

use crate::crdt::types::{NodeId, SiteId};

/// The local clock has no values left to mint ids with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("local clock exhausted")]
pub struct ClockExhausted;

/// Errors raised while parsing or validating identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("site identifier must not be empty")]
    EmptySite,

    #[error("site identifier '{0}' is reserved")]
    ReservedSite(String),

    #[error("malformed node id '{0}': expected '<site>:<clock>'")]
    Malformed(String),

    #[error("invalid clock in node id '{id}': {reason}")]
    InvalidClock { id: String, reason: String },
}

/// Errors returned by local document operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot insert empty content")]
    EmptyContent,

    #[error("invalid site: {0}")]
    InvalidSite(#[from] IdError),

    #[error("node id {0} already exists")]
    DuplicateId(NodeId),

    #[error("no anchor found for insertion at index {index}")]
    NoAnchor { index: usize },

    #[error("site {site} has exhausted its clock, no new ids can be minted")]
    ClockExhausted { site: SiteId },
}

/// Reasons a remote operation is refused by the merge engine.
///
/// Every replica refuses the same payloads, so a rejection never causes
/// divergence on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeRejection {
    #[error("operation is not valid JSON or does not match the wire schema: {0}")]
    Malformed(String),

    #[error("node id {0} uses the reserved root site")]
    ReservedId(NodeId),

    #[error("insert {0} has no parent or side")]
    MissingAnchor(NodeId),

    #[error("insert {0} attaches to the right of the root")]
    RootRightChild(NodeId),

    #[error("the root node cannot be deleted")]
    RootDelete,

    #[error("node id {0} has a clock beyond the mintable range")]
    ClockOutOfRange(NodeId),

    #[error("insert {0} carries an empty value")]
    EmptyValue(NodeId),
}
