//! Reroute Node
//!
//! A pass-through used to tidy up wiring. Both ports start as `ANY` and
//! take the type of whatever is connected to `in`, so the wire keeps its
//! type checking past the reroute. Removing the incoming connection turns
//! them back into `ANY`.

use node_runtime::{
    define_node, BaseTypes, InterfaceTypeRef, Node, NodeDefinition, NodeInterface, NodeTree,
    NodeUpdateEvent, NodeUpdateKind,
};

pub struct RerouteNode;

impl RerouteNode {
    pub const NODE_TYPE: &'static str = "reroute";
    pub const PORT_IN: &'static str = "in";
    pub const PORT_OUT: &'static str = "out";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "control")
            .title("Reroute")
            .input(Self::PORT_IN, || NodeInterface::any("In").hide_default_title())
            .output(Self::PORT_OUT, || NodeInterface::any("Out").hide_default_title())
            .on_update(Self::on_update)
            .calculate(|eval| Ok([(Self::PORT_OUT.to_string(), eval.value(Self::PORT_IN))].into()))
            .build()
    }

    fn on_update(event: &mut NodeUpdateEvent, node: &mut Node, tree: &NodeTree) {
        if event.is_cancelled() || !event.targets(node.id()) {
            return;
        }

        match &event.kind {
            NodeUpdateKind::NewConnection { connection, .. } if connection.target_port == Self::PORT_IN => {
                if let Some(source) = tree.get_interface(&connection.source, &connection.source_port, true) {
                    let adopted = source.interface_type.clone();
                    log::debug!("RerouteNode {}: adopting type '{}'", node.id(), adopted.id());
                    Self::set_types(node, adopted);
                }
            }
            NodeUpdateKind::RemoveConnection { connection, .. } if connection.target_port == Self::PORT_IN => {
                Self::set_types(node, BaseTypes::any());
            }
            _ => {}
        }
    }

    fn set_types(node: &mut Node, interface_type: InterfaceTypeRef) {
        if let Some(input) = node.input_mut(Self::PORT_IN) {
            input.set_type(interface_type.clone());
        }
        if let Some(output) = node.output_mut(Self::PORT_OUT) {
            output.set_type(interface_type);
        }
    }
}

inventory::submit!(node_runtime::NodeTypeFn(RerouteNode::definition));
