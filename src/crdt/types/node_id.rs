//! Unique identifier implementation for sequence nodes.
//!
//! This module contains the NodeId struct which serves as a globally unique
//! identifier for each node in the tree, providing both identity and the
//! tie-break order between concurrent siblings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crdt::error::IdError;
use crate::crdt::types::site::SiteId;

/// A unique identifier for each node of the tree: `(site, clock)`.
///
/// # Ordering
///
/// Ids are ordered by site first (lexicographically), then by clock
/// (numerically). The clock is never compared as text, so `s:2 < s:10`.
///
/// On the wire an id is the string `"<site>:<clock>"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub site: SiteId,
    pub clock: u64,
}

impl NodeId {
    pub fn new(site: SiteId, clock: u64) -> Self {
        NodeId { site, clock }
    }

    /// The id of the root sentinel, `root:0`.
    pub fn root() -> Self {
        NodeId {
            site: SiteId::root(),
            clock: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.site.is_root() && self.clock == 0
    }

    /// Returns true for any id minted under the reserved root site.
    pub fn is_reserved(&self) -> bool {
        self.site.is_root()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.site, self.clock)
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    /// Parses `"<site>:<clock>"`, splitting on the last colon so that site
    /// names may themselves contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (site, clock) = s
            .rsplit_once(':')
            .ok_or_else(|| IdError::Malformed(s.to_string()))?;

        if clock.is_empty() || !clock.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdError::InvalidClock {
                id: s.to_string(),
                reason: "clock must be a non-negative decimal integer".to_string(),
            });
        }
        let clock = clock.parse::<u64>().map_err(|e| IdError::InvalidClock {
            id: s.to_string(),
            reason: e.to_string(),
        })?;
        let site = SiteId::from_wire(site).map_err(|_| IdError::Malformed(s.to_string()))?;

        Ok(NodeId { site, clock })
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
