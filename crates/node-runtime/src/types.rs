//! Core identifiers and records shared across the runtime
//!
//! These types describe node ids, port names, connections and the
//! flow declaration of a node type.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a node instance within a tree
pub type NodeUid = String;

/// Name of a port, unique within one side (inputs or outputs) of a node
pub type PortName = String;

/// Output mapping produced by a node: port name -> value
pub type PortValues = HashMap<String, serde_json::Value>;

/// Name of the synthesized flow input pseudo-port
pub const FLOW_IN: &str = "__flow_in";

/// Name of the synthesized flow output pseudo-port
pub const FLOW_OUT: &str = "__flow_out";

/// Synthetic key of a connection inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Position of a node on the canvas. Opaque to the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Which flow pseudo-ports instances of a node type receive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowMode {
    /// Pure dataflow node
    #[default]
    None,
    /// Gains `__flow_in`
    In,
    /// Gains `__flow_out`
    Out,
    /// Gains both pseudo-ports
    InOut,
}

impl FlowMode {
    pub fn has_flow_in(&self) -> bool {
        matches!(self, FlowMode::In | FlowMode::InOut)
    }

    pub fn has_flow_out(&self) -> bool {
        matches!(self, FlowMode::Out | FlowMode::InOut)
    }

    pub fn uses_flow(&self) -> bool {
        !matches!(self, FlowMode::None)
    }
}

/// A directed edge from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Source node ID
    pub source: NodeUid,
    /// Source (output) port name
    pub source_port: PortName,
    /// Target node ID
    pub target: NodeUid,
    /// Target (input) port name
    pub target_port: PortName,
}

impl Connection {
    pub fn new(
        source: impl Into<NodeUid>,
        source_port: impl Into<PortName>,
        target: impl Into<NodeUid>,
        target_port: impl Into<PortName>,
    ) -> Self {
        Self {
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        }
    }

    /// Whether either endpoint is the given node
    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }

    /// Whether this edge carries control rather than data
    pub fn is_flow_edge(&self) -> bool {
        self.target_port == FLOW_IN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_mode_ports() {
        assert!(!FlowMode::None.uses_flow());
        assert!(FlowMode::In.has_flow_in());
        assert!(!FlowMode::In.has_flow_out());
        assert!(FlowMode::Out.has_flow_out());
        assert!(FlowMode::InOut.has_flow_in() && FlowMode::InOut.has_flow_out());
    }

    #[test]
    fn test_connection_serialization() {
        let conn = Connection::new("a", "out", "b", FLOW_IN);
        assert!(conn.is_flow_edge());
        assert!(conn.touches("a") && conn.touches("b") && !conn.touches("c"));

        let json = serde_json::to_string(&conn).unwrap();
        assert!(json.contains("sourcePort")); // camelCase
        let back: Connection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, conn);
    }
}
