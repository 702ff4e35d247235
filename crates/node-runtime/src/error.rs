//! Error types for the node runtime

use thiserror::Error;

use crate::types::NodeUid;

/// Result type alias using NodeRuntimeError
pub type Result<T> = std::result::Result<T, NodeRuntimeError>;

/// Errors that can occur while building or running a node tree
#[derive(Debug, Error)]
pub enum NodeRuntimeError {
    /// A node type was referenced before being registered
    #[error("Node type not found: {0}")]
    NodeTypeNotFound(String),

    /// Flow ports were requested on a tree that has flow control disabled
    #[error("Flow control is not enabled on this tree (node type '{node_type}')")]
    FlowNotSupported { node_type: String },

    /// An engine was built over a tree without flow support
    #[error("Flow control is not enabled on this tree")]
    FlowDisabled,

    /// The engine was asked to run a node that is not in the tree
    #[error("Node not found: {0}")]
    NodeNotFound(NodeUid),

    /// A flow-bearing node was pulled as a data dependency before being stepped
    #[error("Node has not been run yet: {node_id}")]
    NodeNotRun { node_id: NodeUid },

    /// A pure dataflow dependency loops back onto a node being evaluated
    #[error("Data dependency cycle through node {node_id}")]
    DataCycle { node_id: NodeUid },

    /// A node's calculate function reported a failure
    #[error("Node {node_id} failed: {message}")]
    Calculate { node_id: NodeUid, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}

impl NodeRuntimeError {
    /// Create a calculate error for a node
    pub fn calculate(node_id: impl Into<NodeUid>, message: impl Into<String>) -> Self {
        Self::Calculate {
            node_id: node_id.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts a run because of evaluation order
    pub fn is_execution_order_violation(&self) -> bool {
        matches!(self, Self::NodeNotRun { .. } | Self::DataCycle { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_run_message_carries_node_id() {
        let err = NodeRuntimeError::NodeNotRun {
            node_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Node has not been run yet: abc");
        assert!(err.is_execution_order_violation());
    }

    #[test]
    fn test_calculate_helper() {
        let err = NodeRuntimeError::calculate("n1", "division by zero");
        assert!(matches!(err, NodeRuntimeError::Calculate { ref node_id, .. } if node_id == "n1"));
        assert!(!err.is_execution_order_violation());
    }
}
