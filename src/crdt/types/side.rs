//! Attachment side of a node relative to its parent.

use serde::{Deserialize, Serialize};

/// Which child list of the parent a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}
