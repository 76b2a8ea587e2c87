//! Site identifier type and related functionality.
//!
//! A site identifies one replica of a document. It is embedded in every
//! node id the replica creates, so it must be unique across all replicas
//! editing the same document.

use std::fmt;
use std::sync::Arc;

use crate::crdt::error::IdError;

/// Site name reserved for the root sentinel (`root:0`).
pub const ROOT_SITE: &str = "root";

/// A unique identifier for each replica (collaborator) of a document.
///
/// Sites compare lexicographically as strings; this comparison is the
/// tie-break between concurrent inserts made by different replicas.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteId(Arc<str>);

impl SiteId {
    /// Creates a site identifier for a replica.
    ///
    /// Fails for the empty string and for the reserved root site.
    pub fn new(site: impl AsRef<str>) -> Result<Self, IdError> {
        let site = site.as_ref();
        if site.is_empty() {
            return Err(IdError::EmptySite);
        }
        if site == ROOT_SITE {
            return Err(IdError::ReservedSite(site.to_string()));
        }
        Ok(SiteId(Arc::from(site)))
    }

    /// The site of the root sentinel.
    pub fn root() -> Self {
        SiteId(Arc::from(ROOT_SITE))
    }

    /// Builds a site from a wire id without the replica-side checks.
    pub(crate) fn from_wire(site: &str) -> Result<Self, IdError> {
        if site.is_empty() {
            return Err(IdError::EmptySite);
        }
        Ok(SiteId(Arc::from(site)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        &*self.0 == ROOT_SITE
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
