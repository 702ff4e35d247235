//! Number Node
//!
//! Emits a constant number edited on the node itself.

use node_runtime::{define_node, NodeDefinition, NodeInterface};
use serde_json::json;

/// Constant number
pub struct NumberNode;

impl NumberNode {
    pub const NODE_TYPE: &'static str = "number";
    /// Port ID for the value, used on both sides
    pub const PORT_VALUE: &'static str = "value";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "input")
            .title("Number")
            .description("Constant number")
            .input(Self::PORT_VALUE, || {
                NodeInterface::number("Value").set_port(false)
            })
            .output(Self::PORT_VALUE, || NodeInterface::number("Value"))
            .calculate(|eval| {
                let value = eval.number(Self::PORT_VALUE);
                Ok([(Self::PORT_VALUE.to_string(), json!(value))].into())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(NumberNode::definition));
