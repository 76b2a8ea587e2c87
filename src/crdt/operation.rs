//! Operations exchanged between replicas and their JSON wire format.
//!
//! ```text
//! {"type":"INSERT","data":{"id":"docA:0","parent":"root:0","value":"a","side":"L"}}
//! {"type":"DELETE","data":{"id":"docA:0"}}
//! ```

use serde::{Deserialize, Serialize};

use crate::crdt::types::{NodeId, Side};

/// Payload of an insert: everything a remote replica needs to rebuild the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOp {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub value: String,
    pub side: Option<Side>,
}

/// Payload of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOp {
    pub id: NodeId,
}

/// A self-describing change emitted by a local edit and applied by remote replicas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Operation {
    #[serde(rename = "INSERT")]
    Insert(InsertOp),
    #[serde(rename = "DELETE")]
    Delete(DeleteOp),
}

impl Operation {
    /// Id of the node the operation creates or deletes.
    pub fn id(&self) -> &NodeId {
        match self {
            Operation::Insert(op) => &op.id,
            Operation::Delete(op) => &op.id,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<InsertOp> for Operation {
    fn from(op: InsertOp) -> Self {
        Operation::Insert(op)
    }
}

impl From<DeleteOp> for Operation {
    fn from(op: DeleteOp) -> Self {
        Operation::Delete(op)
    }
}
