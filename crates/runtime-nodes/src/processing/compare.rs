//! Comparison nodes

use node_runtime::{define_node, NodeDefinition, NodeInterface};
use serde_json::{json, Value};

use super::math::{PORT_A, PORT_B, PORT_RESULT};

/// `a > b` on numbers
pub struct GreaterThanNode;

impl GreaterThanNode {
    pub const NODE_TYPE: &'static str = "greater-than";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "logic")
            .title("Greater Than")
            .input(PORT_A, || NodeInterface::number("A"))
            .input(PORT_B, || NodeInterface::number("B"))
            .output(PORT_RESULT, || NodeInterface::boolean("Result"))
            .calculate(|eval| {
                let result = eval.number(PORT_A) > eval.number(PORT_B);
                Ok([(PORT_RESULT.to_string(), json!(result))].into())
            })
            .build()
    }
}

/// Equality on arbitrary values. Numbers compare by value, so `2` equals `2.0`.
pub struct EqualsNode;

impl EqualsNode {
    pub const NODE_TYPE: &'static str = "equals";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "logic")
            .title("Equals")
            .input(PORT_A, || NodeInterface::any("A"))
            .input(PORT_B, || NodeInterface::any("B"))
            .output(PORT_RESULT, || NodeInterface::boolean("Result"))
            .calculate(|eval| {
                let result = values_equal(&eval.value(PORT_A), &eval.value(PORT_B));
                Ok([(PORT_RESULT.to_string(), json!(result))].into())
            })
            .build()
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

inventory::submit!(node_runtime::NodeTypeFn(GreaterThanNode::definition));
inventory::submit!(node_runtime::NodeTypeFn(EqualsNode::definition));
