//! Graph validation for node trees and snapshots
//!
//! The tree keeps its invariants while it is edited, but ports can be
//! retyped by hooks and snapshots can come from anywhere. These checks
//! report every problem instead of stopping at the first one.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::interface_type::InterfaceTypeRef;
use crate::snapshot::TreeSnapshot;
use crate::tree::NodeTree;
use crate::types::{Connection, FLOW_IN, FLOW_OUT};

/// Validation error with location context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A connection references a node that does not exist
    UnknownNode { connection: String, node_id: String },
    /// A connection references a port the node does not have
    UnknownPort {
        connection: String,
        node_id: String,
        port: String,
    },
    /// A connection starts and ends on the same node
    SelfLoop { connection: String, node_id: String },
    /// An input port has more than one incoming connection
    FanInExceeded {
        node_id: String,
        port: String,
        count: usize,
    },
    /// A connection joins ports whose types cannot connect
    IncompatibleTypes {
        connection: String,
        source_type: String,
        target_type: String,
    },
    /// A node has a type that is not registered
    UnknownNodeType { node_id: String, node_type: String },
    /// Data connections (flow edges excluded) form a cycle
    DataCycle { node_ids: Vec<String> },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownNode { connection, node_id } => {
                write!(f, "Connection '{}' references unknown node '{}'", connection, node_id)
            }
            Self::UnknownPort {
                connection,
                node_id,
                port,
            } => write!(
                f,
                "Connection '{}' references unknown port '{}' on node '{}'",
                connection, port, node_id
            ),
            Self::SelfLoop { connection, node_id } => {
                write!(f, "Connection '{}' loops on node '{}'", connection, node_id)
            }
            Self::FanInExceeded { node_id, port, count } => write!(
                f,
                "Input '{}' on node '{}' has {} incoming connections",
                port, node_id, count
            ),
            Self::IncompatibleTypes {
                connection,
                source_type,
                target_type,
            } => write!(
                f,
                "Connection '{}' connects incompatible types: {} -> {}",
                connection, source_type, target_type
            ),
            Self::UnknownNodeType { node_id, node_type } => {
                write!(f, "Unknown node type '{}' for node '{}'", node_type, node_id)
            }
            Self::DataCycle { node_ids } => {
                write!(f, "Data cycle through nodes: {}", node_ids.join(", "))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Resolves the type of a port, `None` if the port does not exist
type PortTypeFn<'a> = dyn Fn(&str, &str, bool) -> Option<InterfaceTypeRef> + 'a;

/// Validate the live graph of a tree
pub fn validate_tree(tree: &NodeTree) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for node in tree.nodes() {
        if !tree.has_node_type(node.type_id()) {
            errors.push(ValidationError::UnknownNodeType {
                node_id: node.id().to_string(),
                node_type: node.type_id().to_string(),
            });
        }
    }

    let node_ids: HashSet<&str> = tree.nodes().map(|n| n.id()).collect();
    let connections: Vec<(String, &Connection)> = tree
        .connections()
        .map(|(id, c)| (id.to_string(), c))
        .collect();
    let port_type = |node: &str, port: &str, is_output: bool| {
        tree.get_interface(node, port, is_output)
            .map(|iface| iface.interface_type.clone())
    };

    validate_connections(&node_ids, &connections, &port_type, &mut errors);
    errors
}

/// Validate a snapshot against the node types registered in `tree`.
///
/// Port types come from the registered definitions, so ports added by
/// hooks at runtime are reported as unknown.
pub fn validate_snapshot(snapshot: &TreeSnapshot, tree: &NodeTree) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut node_types = HashMap::new();
    for node in &snapshot.nodes {
        match tree.get_node_type(&node.type_id) {
            Some(definition) => {
                node_types.insert(node.id.as_str(), definition);
            }
            None => errors.push(ValidationError::UnknownNodeType {
                node_id: node.id.clone(),
                node_type: node.type_id.clone(),
            }),
        }
    }

    let node_ids: HashSet<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    let connections: Vec<(String, &Connection)> = snapshot
        .connections
        .iter()
        .enumerate()
        .map(|(i, c)| (format!("#{}", i), c))
        .collect();
    let port_type = |node: &str, port: &str, is_output: bool| {
        let definition = node_types.get(node)?;
        match (port, is_output) {
            (FLOW_IN, false) if definition.flow.has_flow_in() => {
                Some(crate::interface_type::BaseTypes::flow())
            }
            (FLOW_OUT, true) if definition.flow.has_flow_out() => {
                Some(crate::interface_type::BaseTypes::flow())
            }
            _ => {
                let ports = if is_output {
                    &definition.outputs
                } else {
                    &definition.inputs
                };
                ports
                    .iter()
                    .find(|(name, _)| name == port)
                    .map(|(_, factory)| factory().interface_type)
            }
        }
    };

    validate_connections(&node_ids, &connections, &port_type, &mut errors);
    errors
}

fn validate_connections(
    node_ids: &HashSet<&str>,
    connections: &[(String, &Connection)],
    port_type: &PortTypeFn<'_>,
    errors: &mut Vec<ValidationError>,
) {
    let mut fan_in: HashMap<(&str, &str), usize> = HashMap::new();

    for (label, c) in connections {
        *fan_in
            .entry((c.target.as_str(), c.target_port.as_str()))
            .or_insert(0) += 1;

        if c.source == c.target {
            errors.push(ValidationError::SelfLoop {
                connection: label.clone(),
                node_id: c.source.clone(),
            });
        }

        let mut endpoints_known = true;
        for node in [&c.source, &c.target] {
            if !node_ids.contains(node.as_str()) {
                endpoints_known = false;
                errors.push(ValidationError::UnknownNode {
                    connection: label.clone(),
                    node_id: node.clone(),
                });
            }
        }
        if !endpoints_known {
            continue;
        }

        let source_type = port_type(&c.source, &c.source_port, true);
        let target_type = port_type(&c.target, &c.target_port, false);
        if source_type.is_none() {
            errors.push(ValidationError::UnknownPort {
                connection: label.clone(),
                node_id: c.source.clone(),
                port: c.source_port.clone(),
            });
        }
        if target_type.is_none() {
            errors.push(ValidationError::UnknownPort {
                connection: label.clone(),
                node_id: c.target.clone(),
                port: c.target_port.clone(),
            });
        }
        if let (Some(source), Some(target)) = (source_type, target_type) {
            if !source.can_connect_with(&target) {
                errors.push(ValidationError::IncompatibleTypes {
                    connection: label.clone(),
                    source_type: source.id().to_string(),
                    target_type: target.id().to_string(),
                });
            }
        }
    }

    let mut over: Vec<_> = fan_in.into_iter().filter(|(_, count)| *count > 1).collect();
    over.sort();
    for ((node, port), count) in over {
        errors.push(ValidationError::FanInExceeded {
            node_id: node.to_string(),
            port: port.to_string(),
            count,
        });
    }

    detect_data_cycles(node_ids, connections, errors);
}

/// Detect cycles among data connections using Kahn's algorithm
fn detect_data_cycles(
    node_ids: &HashSet<&str>,
    connections: &[(String, &Connection)],
    errors: &mut Vec<ValidationError>,
) {
    let edges: Vec<&Connection> = connections
        .iter()
        .map(|(_, c)| *c)
        .filter(|c| {
            !c.is_flow_edge()
                && c.source != c.target
                && node_ids.contains(c.source.as_str())
                && node_ids.contains(c.target.as_str())
        })
        .collect();

    let mut in_degree: HashMap<&str, usize> = node_ids.iter().map(|id| (*id, 0)).collect();
    for edge in &edges {
        *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(&id, _)| id)
        .collect();

    while let Some(node_id) = queue.pop_front() {
        for edge in &edges {
            if edge.source == node_id {
                if let Some(deg) = in_degree.get_mut(edge.target.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(&edge.target);
                    }
                }
            }
        }
    }

    let mut remaining: Vec<String> = in_degree
        .into_iter()
        .filter(|(_, deg)| *deg > 0)
        .map(|(id, _)| id.to_string())
        .collect();
    if !remaining.is_empty() {
        remaining.sort();
        errors.push(ValidationError::DataCycle { node_ids: remaining });
    }
}
