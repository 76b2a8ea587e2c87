//! Type definitions for the replicated sequence.
//!
//! This module contains the fundamental identifier types used throughout the
//! tree, organized into focused submodules.

pub mod clock;
pub mod node_id;
pub mod side;
pub mod site;

pub use clock::{LocalClock, MAX_CLOCK};
pub use node_id::NodeId;
pub use side::Side;
pub use site::{ROOT_SITE, SiteId};
