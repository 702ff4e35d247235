//! Text Node
//!
//! Emits a constant string edited on the node itself.

use node_runtime::{define_node, NodeDefinition, NodeInterface};
use serde_json::{json, Value};

/// Constant text
pub struct TextNode;

impl TextNode {
    pub const NODE_TYPE: &'static str = "text";
    pub const PORT_VALUE: &'static str = "value";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "input")
            .title("Text")
            .description("Constant text")
            .input(Self::PORT_VALUE, || {
                NodeInterface::text("Value")
                    .set_port(false)
                    .with_default_value(Value::from(""))
            })
            .output(Self::PORT_VALUE, || NodeInterface::text("Value"))
            .calculate(|eval| {
                let text = eval.text(Self::PORT_VALUE);
                Ok([(Self::PORT_VALUE.to_string(), json!(text))].into())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(TextNode::definition));
