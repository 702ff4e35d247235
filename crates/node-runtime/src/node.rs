//! Node instances

use std::collections::BTreeMap;

use serde_json::Value;

use crate::descriptor::NodeDefinition;
use crate::interface::NodeInterface;
use crate::types::{NodeUid, PortName, Position, FLOW_IN, FLOW_OUT};

/// A live instantiation of a node type inside a tree
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeUid,
    type_id: String,
    /// Canvas position, owned by the UI
    pub position: Position,
    inputs: BTreeMap<PortName, NodeInterface>,
    outputs: BTreeMap<PortName, NodeInterface>,
    flow_in: Option<NodeInterface>,
    flow_out: Option<NodeInterface>,
    /// Free-form state for the node's hooks and calculate function
    pub data: Value,
}

impl Node {
    /// Build an instance, invoking every port factory of the definition once
    pub(crate) fn instantiate(definition: &NodeDefinition, id: NodeUid, position: Position) -> Self {
        let inputs = definition
            .inputs
            .iter()
            .map(|(name, factory)| (name.clone(), factory()))
            .collect();
        let outputs = definition
            .outputs
            .iter()
            .map(|(name, factory)| (name.clone(), factory()))
            .collect();

        Self {
            id,
            type_id: definition.id.clone(),
            position,
            inputs,
            outputs,
            flow_in: definition
                .flow
                .has_flow_in()
                .then(|| NodeInterface::flow("").hide_default_title()),
            flow_out: definition
                .flow
                .has_flow_out()
                .then(|| NodeInterface::flow("").hide_default_title()),
            data: Value::Null,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn input(&self, name: &str) -> Option<&NodeInterface> {
        self.inputs.get(name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut NodeInterface> {
        self.inputs.get_mut(name)
    }

    pub fn output(&self, name: &str) -> Option<&NodeInterface> {
        self.outputs.get(name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut NodeInterface> {
        self.outputs.get_mut(name)
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&PortName, &NodeInterface)> {
        self.inputs.iter()
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&PortName, &NodeInterface)> {
        self.outputs.iter()
    }

    pub fn input_names(&self) -> Vec<PortName> {
        self.inputs.keys().cloned().collect()
    }

    pub fn output_names(&self) -> Vec<PortName> {
        self.outputs.keys().cloned().collect()
    }

    /// Add (or replace) an input port. Meant for `on_create`/`on_update` hooks.
    pub fn add_input(&mut self, name: impl Into<PortName>, interface: NodeInterface) {
        self.inputs.insert(name.into(), interface);
    }

    /// Add (or replace) an output port. Meant for `on_create`/`on_update` hooks.
    pub fn add_output(&mut self, name: impl Into<PortName>, interface: NodeInterface) {
        self.outputs.insert(name.into(), interface);
    }

    pub fn flow_in_interface(&self) -> Option<&NodeInterface> {
        self.flow_in.as_ref()
    }

    pub fn flow_out_interface(&self) -> Option<&NodeInterface> {
        self.flow_out.as_ref()
    }

    /// Resolve a port, including the flow pseudo-ports
    pub fn interface(&self, port: &str, is_output: bool) -> Option<&NodeInterface> {
        match (port, is_output) {
            (FLOW_IN, false) => self.flow_in.as_ref(),
            (FLOW_OUT, true) => self.flow_out.as_ref(),
            (_, false) => self.inputs.get(port),
            (_, true) => self.outputs.get(port),
        }
    }

    pub fn interface_mut(&mut self, port: &str, is_output: bool) -> Option<&mut NodeInterface> {
        match (port, is_output) {
            (FLOW_IN, false) => self.flow_in.as_mut(),
            (FLOW_OUT, true) => self.flow_out.as_mut(),
            (_, false) => self.inputs.get_mut(port),
            (_, true) => self.outputs.get_mut(port),
        }
    }

    /// Every port name on one side, flow pseudo-port included
    pub(crate) fn port_names(&self, is_output: bool) -> Vec<PortName> {
        let (ports, flow, flow_name) = if is_output {
            (&self.outputs, &self.flow_out, FLOW_OUT)
        } else {
            (&self.inputs, &self.flow_in, FLOW_IN)
        };
        let mut names: Vec<PortName> = ports.keys().cloned().collect();
        if flow.is_some() {
            names.push(flow_name.to_string());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::define_node;
    use crate::types::FlowMode;

    #[test]
    fn test_instantiate_with_flow_ports() {
        let def = define_node("step", "test")
            .flow(FlowMode::InOut)
            .input("value", || NodeInterface::any("Value"))
            .output("then", || NodeInterface::flow("Then"))
            .build();

        let node = Node::instantiate(&def, "n1".to_string(), Position::new(10.0, 20.0));
        assert_eq!(node.id(), "n1");
        assert_eq!(node.type_id(), "step");
        assert!(node.interface(FLOW_IN, false).is_some());
        assert!(node.interface(FLOW_OUT, true).is_some());
        assert!(node.interface(FLOW_IN, true).is_none());
        assert_eq!(node.port_names(false), vec!["value".to_string(), FLOW_IN.to_string()]);
        assert_eq!(node.port_names(true), vec!["then".to_string(), FLOW_OUT.to_string()]);
    }

    #[test]
    fn test_instances_do_not_share_interfaces() {
        let def = define_node("n", "test")
            .input("x", || NodeInterface::number("X"))
            .build();

        let mut a = Node::instantiate(&def, "a".to_string(), Position::default());
        let b = Node::instantiate(&def, "b".to_string(), Position::default());
        a.input_mut("x").unwrap().value = Some(serde_json::json!(9));

        assert_eq!(b.input("x").unwrap().value, Some(serde_json::json!(0)));
        assert!(a.flow_in_interface().is_none() && a.flow_out_interface().is_none());
    }

    #[test]
    fn test_dynamic_ports() {
        let def = define_node("n", "test").build();
        let mut node = Node::instantiate(&def, "a".to_string(), Position::default());
        node.add_output("extra", NodeInterface::text("Extra"));
        assert_eq!(node.output_names(), vec!["extra".to_string()]);
    }
}
