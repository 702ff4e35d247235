//! Arithmetic nodes
//!
//! All four take two numbers `a` and `b` and produce `result`.

use node_runtime::{define_node, NodeDefinition, NodeInterface, NodeRuntimeError};
use serde_json::json;

/// Port ID for the left operand
pub const PORT_A: &str = "a";
/// Port ID for the right operand
pub const PORT_B: &str = "b";
/// Port ID for the result
pub const PORT_RESULT: &str = "result";

/// Build a two-operand number node. `op` returns `None` when the operands
/// are invalid, which fails the node with `failure`.
fn binary_node(
    node_type: &str,
    title: &str,
    op: fn(f64, f64) -> Option<f64>,
    failure: &'static str,
) -> NodeDefinition {
    define_node(node_type, "math")
        .title(title)
        .input(PORT_A, || NodeInterface::number("A"))
        .input(PORT_B, || NodeInterface::number("B"))
        .output(PORT_RESULT, || NodeInterface::number("Result"))
        .calculate(move |eval| {
            let a = eval.number(PORT_A);
            let b = eval.number(PORT_B);
            let result = op(a, b).ok_or_else(|| NodeRuntimeError::calculate(eval.node_id(), failure))?;
            log::trace!("{} {}: {} {} -> {}", eval.node().type_id(), eval.node_id(), a, b, result);
            Ok([(PORT_RESULT.to_string(), json!(result))].into())
        })
        .build()
}

pub struct AddNode;

impl AddNode {
    pub const NODE_TYPE: &'static str = "add";

    pub fn definition() -> NodeDefinition {
        binary_node(Self::NODE_TYPE, "Add", |a, b| Some(a + b), "addition failed")
    }
}

pub struct SubtractNode;

impl SubtractNode {
    pub const NODE_TYPE: &'static str = "subtract";

    pub fn definition() -> NodeDefinition {
        binary_node(Self::NODE_TYPE, "Subtract", |a, b| Some(a - b), "subtraction failed")
    }
}

pub struct MultiplyNode;

impl MultiplyNode {
    pub const NODE_TYPE: &'static str = "multiply";

    pub fn definition() -> NodeDefinition {
        binary_node(Self::NODE_TYPE, "Multiply", |a, b| Some(a * b), "multiplication failed")
    }
}

/// Division; a zero divisor fails the node
pub struct DivideNode;

impl DivideNode {
    pub const NODE_TYPE: &'static str = "divide";

    pub fn definition() -> NodeDefinition {
        binary_node(
            Self::NODE_TYPE,
            "Divide",
            |a, b| (b != 0.0).then(|| a / b),
            "division by zero",
        )
    }
}

inventory::submit!(node_runtime::NodeTypeFn(AddNode::definition));
inventory::submit!(node_runtime::NodeTypeFn(SubtractNode::definition));
inventory::submit!(node_runtime::NodeTypeFn(MultiplyNode::definition));
inventory::submit!(node_runtime::NodeTypeFn(DivideNode::definition));
