//! Repeat Node
//!
//! Fires its `body` flow `count` times. Before each iteration the current
//! index is published on the `index` output, so nodes inside the body can
//! read it through a data connection.

use node_runtime::{define_node, FlowMode, NodeDefinition, NodeInterface, PortValues};
use serde_json::{json, Value};

pub struct RepeatNode;

impl RepeatNode {
    pub const NODE_TYPE: &'static str = "repeat";
    pub const PORT_COUNT: &'static str = "count";
    pub const PORT_BODY: &'static str = "body";
    pub const PORT_INDEX: &'static str = "index";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "control")
            .title("Repeat")
            .description("Runs the body flow a number of times")
            .flow(FlowMode::In)
            .input(Self::PORT_COUNT, || NodeInterface::number("Count"))
            .output(Self::PORT_BODY, || NodeInterface::flow("Body"))
            .output(Self::PORT_INDEX, || NodeInterface::number("Index"))
            .calculate(|eval| {
                // Negative and NaN counts run zero times
                let count = eval.number(Self::PORT_COUNT).max(0.0) as u64;
                log::debug!("RepeatNode {}: {} iterations", eval.node_id(), count);

                let mut last = Value::Null;
                for i in 0..count {
                    last = json!(i);
                    let output: PortValues = [(Self::PORT_INDEX.to_string(), last.clone())].into();
                    eval.fire(Self::PORT_BODY, Some(output))?;
                }
                Ok([(Self::PORT_INDEX.to_string(), last)].into())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(RepeatNode::definition));

#[cfg(test)]
mod tests {
    use super::*;
    use node_runtime::{ForwardEngine, NodeTree};

    #[test]
    fn test_unconnected_body_still_counts() {
        let mut tree = NodeTree::new();
        tree.register_node_type(RepeatNode::definition()).unwrap();
        let id = tree.insert_node_at(RepeatNode::NODE_TYPE, (0.0, 0.0)).unwrap();
        tree.set_interface_value(&id, RepeatNode::PORT_COUNT, false, json!(4));

        let mut engine = ForwardEngine::new(&tree).unwrap();
        engine.run_from_id(&id, true).unwrap();
        assert_eq!(engine.output_value(&id, "index"), Some(&json!(3)));
    }

    #[test]
    fn test_negative_count() {
        let mut tree = NodeTree::new();
        tree.register_node_type(RepeatNode::definition()).unwrap();
        let id = tree.insert_node_at(RepeatNode::NODE_TYPE, (0.0, 0.0)).unwrap();
        tree.set_interface_value(&id, RepeatNode::PORT_COUNT, false, json!(-2));

        let mut engine = ForwardEngine::new(&tree).unwrap();
        engine.run_from_id(&id, true).unwrap();
        assert_eq!(engine.output_value(&id, "index"), Some(&Value::Null));
    }
}
