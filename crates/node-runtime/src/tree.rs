//! The node tree: node type registry, node instances and connections
//!
//! All structural edits go through the tree so it can keep its
//! invariants:
//!
//! - a node never connects to itself
//! - connected ports have compatible types
//! - an input port has at most one incoming connection
//! - removing a node leaves no connection referencing it
//!
//! Connection changes are announced to the `on_update` hooks of both
//! endpoints, which may cancel them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{collected_definitions, NodeDefinition};
use crate::error::{NodeRuntimeError, Result};
use crate::interface::NodeInterface;
use crate::interface_type::InterfaceTypeRef;
use crate::node::Node;
use crate::types::{Connection, ConnectionId, NodeUid, Position, FLOW_OUT};
use crate::update::NodeUpdateEvent;

/// Tree-level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeConfig {
    /// Whether node types may declare flow pseudo-ports
    pub supports_flow: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { supports_flow: true }
    }
}

/// Owns node types, node instances and the connections between them
#[derive(Debug, Default)]
pub struct NodeTree {
    config: TreeConfig,
    registered_node_types: HashMap<String, Arc<NodeDefinition>>,
    categories: BTreeMap<String, Vec<String>>,
    nodes: HashMap<NodeUid, Node>,
    /// Node ids in insertion order
    node_order: Vec<NodeUid>,
    connections: BTreeMap<ConnectionId, Connection>,
    next_connection_id: u64,
}

impl NodeTree {
    /// Create an empty tree with flow control enabled
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn supports_flow(&self) -> bool {
        self.config.supports_flow
    }

    // ---------------------------------------------------------------------
    // Node type registry
    // ---------------------------------------------------------------------

    /// Register a node type and index it under its category.
    ///
    /// A type with the same id replaces the earlier registration.
    pub fn register_node_type(&mut self, definition: NodeDefinition) -> Result<()> {
        if definition.uses_flow() && !self.supports_flow() {
            return Err(NodeRuntimeError::FlowNotSupported {
                node_type: definition.id,
            });
        }

        if let Some(previous) = self.registered_node_types.remove(&definition.id) {
            log::warn!("Replacing registration of node type '{}'", previous.id);
            if let Some(ids) = self.categories.get_mut(&previous.category) {
                ids.retain(|id| *id != previous.id);
                if ids.is_empty() {
                    self.categories.remove(&previous.category);
                }
            }
        }

        log::debug!(
            "Registered node type '{}' in category '{}'",
            definition.id,
            definition.category
        );
        self.categories
            .entry(definition.category.clone())
            .or_default()
            .push(definition.id.clone());
        self.registered_node_types
            .insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    /// Register every definition submitted through `inventory`.
    ///
    /// Flow-bearing definitions are skipped on a tree without flow support.
    /// Returns the number of registered types.
    pub fn register_collected(&mut self) -> Result<usize> {
        let mut registered = 0;
        for definition in collected_definitions() {
            if definition.uses_flow() && !self.supports_flow() {
                log::debug!("Skipping flow node type '{}'", definition.id);
                continue;
            }
            self.register_node_type(definition)?;
            registered += 1;
        }
        Ok(registered)
    }

    pub fn get_node_type(&self, type_id: &str) -> Option<&NodeDefinition> {
        self.registered_node_types.get(type_id).map(|d| d.as_ref())
    }

    pub fn has_node_type(&self, type_id: &str) -> bool {
        self.registered_node_types.contains_key(type_id)
    }

    /// All registered definitions
    pub fn node_types(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.registered_node_types.values().map(|d| d.as_ref())
    }

    /// Category -> type ids, in registration order
    pub fn categories(&self) -> &BTreeMap<String, Vec<String>> {
        &self.categories
    }

    // ---------------------------------------------------------------------
    // Nodes
    // ---------------------------------------------------------------------

    /// Create an instance of a registered type and return its id
    pub fn insert_node_at(&mut self, type_id: &str, position: impl Into<Position>) -> Result<NodeUid> {
        let id = uuid::Uuid::new_v4().to_string();
        self.insert_node_with_id(type_id, id, position.into())
    }

    /// Create an instance under a caller-chosen id (used when restoring)
    pub(crate) fn insert_node_with_id(
        &mut self,
        type_id: &str,
        id: NodeUid,
        position: Position,
    ) -> Result<NodeUid> {
        let definition = self
            .registered_node_types
            .get(type_id)
            .cloned()
            .ok_or_else(|| NodeRuntimeError::NodeTypeNotFound(type_id.to_string()))?;

        let mut node = Node::instantiate(&definition, id.clone(), position);
        if let Some(on_create) = &definition.on_create {
            on_create(&mut node, &*self);
        }

        log::debug!("Inserted node {} of type '{}'", id, type_id);
        if self.nodes.insert(id.clone(), node).is_none() {
            self.node_order.push(id.clone());
        }
        Ok(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access for position, data and value edits
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the node's type declares flow pseudo-ports
    pub fn is_node_using_flow(&self, id: &str) -> bool {
        self.nodes
            .get(id)
            .and_then(|n| self.get_node_type(n.type_id()))
            .is_some_and(|d| d.uses_flow())
    }

    /// Remove a node and every connection touching it
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let (inputs, outputs) = {
            let node = self.nodes.get(id)?;
            (node.port_names(false), node.port_names(true))
        };

        for port in &inputs {
            for conn_id in self.connection_ids_at(id, port, false) {
                self.detach(conn_id);
            }
        }
        for port in &outputs {
            for conn_id in self.connection_ids_at(id, port, true) {
                self.detach(conn_id);
            }
        }

        // Deletion is final: vetoed removals cannot keep the node's edges alive
        let leftovers: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, c)| c.touches(id))
            .map(|(conn_id, _)| *conn_id)
            .collect();
        if !leftovers.is_empty() {
            log::warn!(
                "Dropping {} vetoed connection(s) of removed node {}",
                leftovers.len(),
                id
            );
            for conn_id in leftovers {
                self.connections.remove(&conn_id);
            }
        }

        log::debug!("Removed node {}", id);
        self.node_order.retain(|n| n != id);
        self.nodes.remove(id)
    }

    // ---------------------------------------------------------------------
    // Interfaces
    // ---------------------------------------------------------------------

    /// Resolve a port, including `__flow_in` / `__flow_out`
    pub fn get_interface(&self, node: &str, port: &str, is_output: bool) -> Option<&NodeInterface> {
        self.nodes.get(node)?.interface(port, is_output)
    }

    pub fn get_interface_mut(
        &mut self,
        node: &str,
        port: &str,
        is_output: bool,
    ) -> Option<&mut NodeInterface> {
        self.nodes.get_mut(node)?.interface_mut(port, is_output)
    }

    /// Set the current value of a port. Returns false if the port is unknown.
    pub fn set_interface_value(&mut self, node: &str, port: &str, is_output: bool, value: Value) -> bool {
        match self.get_interface_mut(node, port, is_output) {
            Some(iface) => {
                iface.value = Some(value);
                true
            }
            None => false,
        }
    }

    // ---------------------------------------------------------------------
    // Connections
    // ---------------------------------------------------------------------

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> {
        self.connections.iter().map(|(id, c)| (*id, c))
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// The connection feeding an input port, if any
    pub fn get_connection_to_target(&self, node: &str, port: &str) -> Option<(ConnectionId, &Connection)> {
        self.connections()
            .find(|(_, c)| c.target == node && c.target_port == port)
    }

    /// The first connection leaving an output port, if any
    pub fn get_connection_from_source(&self, node: &str, port: &str) -> Option<(ConnectionId, &Connection)> {
        self.connections()
            .find(|(_, c)| c.source == node && c.source_port == port)
    }

    /// Every connection leaving an output port
    pub fn connections_from_source<'a>(
        &'a self,
        node: &'a str,
        port: &'a str,
    ) -> impl Iterator<Item = (ConnectionId, &'a Connection)> + 'a {
        self.connections()
            .filter(move |(_, c)| c.source == node && c.source_port == port)
    }

    /// Connections whose target is the node, excluding flow edges
    pub fn data_dependencies(&self, node: &str) -> Vec<(ConnectionId, Connection)> {
        self.connections()
            .filter(|(_, c)| c.target == node && !c.is_flow_edge())
            .map(|(id, c)| (id, c.clone()))
            .collect()
    }

    /// Node continued by a flow output: the target of the first connection
    /// from `port` into a `__flow_in`. Data ports fed by the same output are
    /// ignored.
    pub fn flow_target(&self, node: &str, port: &str) -> Option<NodeUid> {
        self.connections_from_source(node, port)
            .find(|(_, c)| c.is_flow_edge())
            .map(|(_, c)| c.target.clone())
    }

    /// Next node along the `__flow_out` chain
    pub fn next_in_flow(&self, node: &str) -> Option<NodeUid> {
        self.flow_target(node, FLOW_OUT)
    }

    /// Connect an output port to an input port.
    ///
    /// Returns `None` without touching the graph when the connection is a
    /// self-loop, a port is unknown or has `has_port` unset, the types are
    /// incompatible, or the existing connection on the target port refuses
    /// to be removed. An existing connection on the target port is replaced.
    /// Types are checked again once it is gone, since its removal hooks may
    /// retype the ports; a failed re-check or a hook cancelling the new
    /// connection leaves the port empty.
    pub fn connect(
        &mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Option<ConnectionId> {
        if source == target {
            log::debug!("Rejected self-loop on node {}", source);
            return None;
        }

        let source_iface = self.get_interface(source, source_port, true)?;
        let target_iface = self.get_interface(target, target_port, false)?;
        if !source_iface.has_port || !target_iface.has_port {
            log::debug!(
                "Rejected connection {}.{} -> {}.{}: interface has no port",
                source,
                source_port,
                target,
                target_port
            );
            return None;
        }
        self.check_types(source, source_port, target, target_port)?;

        let existing = self
            .get_connection_to_target(target, target_port)
            .map(|(id, _)| id);
        if let Some(existing) = existing {
            if let Some((_, true)) = self.detach(existing) {
                log::debug!(
                    "Kept existing connection {} into {}.{}: removal was vetoed",
                    existing,
                    target,
                    target_port
                );
                return None;
            }
        }

        // Removal hooks may have retyped either endpoint
        let (source_type, target_type) = self.check_types(source, source_port, target, target_port)?;

        let connection = Connection::new(source, source_port, target, target_port);
        let event = NodeUpdateEvent::new_connection(connection.clone(), source_type.id(), target_type.id());
        let event = self.notify_node_update(source, event);
        let event = self.notify_node_update(target, event);
        if event.is_cancelled() {
            log::debug!(
                "Connection {}.{} -> {}.{} cancelled by node hook",
                source,
                source_port,
                target,
                target_port
            );
            return None;
        }

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        log::debug!("Connected {}.{} -> {}.{} as {}", source, source_port, target, target_port, id);
        self.connections.insert(id, connection);
        Some(id)
    }

    /// Remove the connection at a port.
    ///
    /// Returns the connection that was found, or `None` if the port had
    /// none. If a hook cancels the removal the connection is put back.
    pub fn remove_connection(&mut self, node: &str, port: &str, is_output: bool) -> Option<Connection> {
        let id = if is_output {
            self.get_connection_from_source(node, port)
        } else {
            self.get_connection_to_target(node, port)
        }
        .map(|(id, _)| id)?;

        self.detach(id).map(|(connection, _)| connection)
    }

    /// Deliver an update event to a node's `on_update` hook, if it has one
    pub fn notify_node_update(&mut self, node: &str, mut event: NodeUpdateEvent) -> NodeUpdateEvent {
        let hook = self
            .nodes
            .get(node)
            .and_then(|n| self.registered_node_types.get(n.type_id()))
            .and_then(|d| d.on_update.clone());

        if let Some(hook) = hook {
            if let Some(mut instance) = self.nodes.remove(node) {
                hook(&mut event, &mut instance, &*self);
                self.nodes.insert(node.to_string(), instance);
            }
        }
        event
    }

    /// Drop all nodes and connections, keeping registered types
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.node_order.clear();
        self.connections.clear();
    }

    /// Resolve both endpoint types and check that they can be connected
    fn check_types(
        &self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Option<(InterfaceTypeRef, InterfaceTypeRef)> {
        let source_type = self.get_interface(source, source_port, true)?.interface_type.clone();
        let target_type = self.get_interface(target, target_port, false)?.interface_type.clone();
        if !source_type.can_connect_with(&target_type) {
            log::debug!(
                "Rejected connection {}.{} -> {}.{}: '{}' cannot feed '{}'",
                source,
                source_port,
                target,
                target_port,
                source_type.id(),
                target_type.id()
            );
            return None;
        }
        Some((source_type, target_type))
    }

    /// Delete a connection and notify both endpoints. Returns the connection
    /// and whether a hook vetoed (and thereby restored) it.
    fn detach(&mut self, id: ConnectionId) -> Option<(Connection, bool)> {
        let connection = self.connections.remove(&id)?;

        let event = NodeUpdateEvent::remove_connection(id, connection.clone());
        let event = self.notify_node_update(&connection.source, event);
        let event = self.notify_node_update(&connection.target, event);
        if event.is_cancelled() {
            log::debug!("Removal of {} cancelled by node hook", id);
            self.connections.insert(id, connection.clone());
            return Some((connection, true));
        }

        log::debug!("Removed connection {}", id);
        Some((connection, false))
    }

    fn connection_ids_at(&self, node: &str, port: &str, is_output: bool) -> Vec<ConnectionId> {
        self.connections()
            .filter(|(_, c)| {
                if is_output {
                    c.source == node && c.source_port == port
                } else {
                    c.target == node && c.target_port == port
                }
            })
            .map(|(id, _)| id)
            .collect()
    }
}
