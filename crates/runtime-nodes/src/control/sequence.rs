//! Sequence Node
//!
//! Fires `first`, then `second`.

use node_runtime::{define_node, FlowMode, NodeDefinition, NodeInterface, PortValues};

pub struct SequenceNode;

impl SequenceNode {
    pub const NODE_TYPE: &'static str = "sequence";
    pub const PORT_FIRST: &'static str = "first";
    pub const PORT_SECOND: &'static str = "second";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "control")
            .title("Sequence")
            .description("Runs two flows one after the other")
            .flow(FlowMode::In)
            .output(Self::PORT_FIRST, || NodeInterface::flow("First"))
            .output(Self::PORT_SECOND, || NodeInterface::flow("Second"))
            .calculate(|eval| {
                eval.fire(Self::PORT_FIRST, None)?;
                eval.fire(Self::PORT_SECOND, None)?;
                Ok(PortValues::new())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(SequenceNode::definition));
