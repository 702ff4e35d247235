//! Serializable snapshots of a tree's graph
//!
//! A snapshot holds what cannot be derived by replaying inserts and
//! connects: node ids, type ids, positions, interface values, node data
//! and the connection list. Registered node types are not part of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NodeRuntimeError, Result};
use crate::tree::NodeTree;
use crate::types::{Connection, NodeUid, PortName, Position};

/// zstd level used for compressed snapshots
const COMPRESSION_LEVEL: i32 = 3;

/// One node of a [`TreeSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub id: NodeUid,
    pub type_id: String,
    #[serde(default)]
    pub position: Position,
    /// Current input values, only for interfaces that have one
    #[serde(default)]
    pub inputs: BTreeMap<PortName, Value>,
    #[serde(default)]
    pub outputs: BTreeMap<PortName, Value>,
    #[serde(default)]
    pub data: Value,
}

/// Graph state of a [`NodeTree`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<Connection>,
}

impl TreeSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// JSON encoded and zstd compressed
    pub fn to_compressed(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        zstd::encode_all(&json[..], COMPRESSION_LEVEL)
            .map_err(|e| NodeRuntimeError::Compression(e.to_string()))
    }

    pub fn from_compressed(bytes: &[u8]) -> Result<Self> {
        let json = zstd::decode_all(bytes).map_err(|e| NodeRuntimeError::Compression(e.to_string()))?;
        Ok(serde_json::from_slice(&json)?)
    }
}

impl NodeTree {
    /// Capture nodes and connections
    pub fn snapshot(&self) -> TreeSnapshot {
        let nodes = self
            .nodes()
            .map(|node| NodeSnapshot {
                id: node.id().to_string(),
                type_id: node.type_id().to_string(),
                position: node.position,
                inputs: node
                    .inputs()
                    .filter_map(|(name, iface)| iface.value.clone().map(|v| (name.clone(), v)))
                    .collect(),
                outputs: node
                    .outputs()
                    .filter_map(|(name, iface)| iface.value.clone().map(|v| (name.clone(), v)))
                    .collect(),
                data: node.data.clone(),
            })
            .collect();

        TreeSnapshot {
            nodes,
            connections: self.connections().map(|(_, c)| c.clone()).collect(),
        }
    }

    /// Replace the graph with a snapshot.
    ///
    /// Nodes are re-inserted under their recorded ids and connections are
    /// replayed through [`connect`](NodeTree::connect), so node hooks run as
    /// they did originally. Connections the tree rejects are dropped with a
    /// warning. Fails without touching the tree if a node type is unknown.
    pub fn restore(&mut self, snapshot: &TreeSnapshot) -> Result<()> {
        if let Some(missing) = snapshot.nodes.iter().find(|n| !self.has_node_type(&n.type_id)) {
            return Err(NodeRuntimeError::NodeTypeNotFound(missing.type_id.clone()));
        }

        self.clear();
        for saved in &snapshot.nodes {
            let id = self.insert_node_with_id(&saved.type_id, saved.id.clone(), saved.position)?;
            for (port, value) in &saved.inputs {
                if !self.set_interface_value(&id, port, false, value.clone()) {
                    log::warn!("Snapshot input '{}' does not exist on node {}", port, id);
                }
            }
            for (port, value) in &saved.outputs {
                if !self.set_interface_value(&id, port, true, value.clone()) {
                    log::warn!("Snapshot output '{}' does not exist on node {}", port, id);
                }
            }
            if let Some(node) = self.node_mut(&id) {
                node.data = saved.data.clone();
            }
        }

        for c in &snapshot.connections {
            if self
                .connect(&c.source, &c.source_port, &c.target, &c.target_port)
                .is_none()
            {
                log::warn!(
                    "Dropped connection {}.{} -> {}.{} while restoring",
                    c.source,
                    c.source_port,
                    c.target,
                    c.target_port
                );
            }
        }

        log::debug!(
            "Restored {} nodes and {} connections",
            self.node_count(),
            self.connection_count()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::define_node;
    use crate::interface::NodeInterface;
    use crate::types::{FlowMode, FLOW_IN, FLOW_OUT};
    use serde_json::json;

    fn tree() -> NodeTree {
        let mut tree = NodeTree::new();
        tree.register_node_type(
            define_node("num", "input")
                .input("value", || NodeInterface::number("Value").set_port(false))
                .output("out", || NodeInterface::number("Out"))
                .build(),
        )
        .unwrap();
        tree.register_node_type(
            define_node("show", "output")
                .flow(FlowMode::InOut)
                .input("value", || NodeInterface::any("Value"))
                .build(),
        )
        .unwrap();
        tree
    }

    #[test]
    fn test_snapshot_restore_preserves_graph() {
        let mut source = tree();
        let num = source.insert_node_at("num", (10.0, 20.0)).unwrap();
        let a = source.insert_node_at("show", (0.0, 0.0)).unwrap();
        let b = source.insert_node_at("show", (0.0, 0.0)).unwrap();
        source.set_interface_value(&num, "value", false, json!(42));
        source.node_mut(&a).unwrap().data = json!({"label": "first"});
        source.connect(&num, "out", &a, "value").unwrap();
        source.connect(&a, FLOW_OUT, &b, FLOW_IN).unwrap();

        let snapshot = source.snapshot();
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.connections.len(), 2);

        let mut target = tree();
        target.restore(&snapshot).unwrap();
        let restored = target.node(&num).unwrap();
        assert_eq!(restored.position, Position::new(10.0, 20.0));
        assert_eq!(restored.input("value").unwrap().value, Some(json!(42)));
        assert_eq!(target.node(&a).unwrap().data["label"], "first");
        assert_eq!(target.next_in_flow(&a), Some(b.clone()));
        assert_eq!(target.snapshot(), snapshot);
    }

    #[test]
    fn test_restore_unknown_type_leaves_tree_untouched() {
        let mut tree = tree();
        let existing = tree.insert_node_at("num", (0.0, 0.0)).unwrap();
        let snapshot = TreeSnapshot {
            nodes: vec![NodeSnapshot {
                id: "x".to_string(),
                type_id: "gone".to_string(),
                position: Position::default(),
                inputs: BTreeMap::new(),
                outputs: BTreeMap::new(),
                data: Value::Null,
            }],
            connections: Vec::new(),
        };

        assert!(matches!(tree.restore(&snapshot), Err(NodeRuntimeError::NodeTypeNotFound(_))));
        assert!(tree.node(&existing).is_some());
    }

    #[test]
    fn test_restore_drops_invalid_connections() {
        let mut tree = tree();
        let snapshot = TreeSnapshot::from_json(
            r#"{
                "nodes": [
                    {"id": "n1", "typeId": "num", "position": {"x": 0.0, "y": 0.0}},
                    {"id": "n2", "typeId": "show"}
                ],
                "connections": [
                    {"source": "n1", "sourcePort": "out", "target": "n1", "targetPort": "value"},
                    {"source": "n1", "sourcePort": "out", "target": "n2", "targetPort": "value"}
                ]
            }"#,
        )
        .unwrap();

        tree.restore(&snapshot).unwrap();
        assert_eq!(tree.node_count(), 2);
        assert_eq!(tree.connection_count(), 1);
    }

    #[test]
    fn test_compressed_round_trip() {
        let mut tree = tree();
        let num = tree.insert_node_at("num", (1.0, 2.0)).unwrap();
        tree.set_interface_value(&num, "value", false, json!(7));

        let snapshot = tree.snapshot();
        let bytes = snapshot.to_compressed().unwrap();
        assert_eq!(TreeSnapshot::from_compressed(&bytes).unwrap(), snapshot);
        assert!(TreeSnapshot::from_compressed(b"not zstd").is_err());
    }
}
