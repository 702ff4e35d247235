//! Print Node
//!
//! Writes a value to the host. With a print log in the execution context
//! (see [`setup_context`](crate::setup::setup_context)) the line is
//! appended there, otherwise it goes to the `log` output at info level.

use node_runtime::{define_node, FlowMode, NodeDefinition, NodeInterface, PortValues};

use crate::setup::print_log;

pub struct PrintNode;

impl PrintNode {
    pub const NODE_TYPE: &'static str = "print";
    pub const PORT_VALUE: &'static str = "value";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "output")
            .title("Print")
            .description("Writes a value to the host")
            .flow(FlowMode::InOut)
            .input(Self::PORT_VALUE, || NodeInterface::any("Value"))
            .calculate(|eval| {
                let line = eval.text(Self::PORT_VALUE);
                match print_log(eval.context()) {
                    Some(lines) => lines.lock().push(line),
                    None => log::info!("PrintNode {}: {}", eval.node_id(), line),
                }
                Ok(PortValues::new())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(PrintNode::definition));

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_context;
    use node_runtime::{ForwardEngine, NodeTree};
    use serde_json::json;

    #[test]
    fn test_prints_to_log() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut tree = NodeTree::new();
        tree.register_node_type(PrintNode::definition()).unwrap();
        let id = tree.insert_node_at(PrintNode::NODE_TYPE, (0.0, 0.0)).unwrap();
        tree.set_interface_value(&id, "value", false, json!({"a": 1}));

        let (context, log) = setup_context();
        let mut engine = ForwardEngine::new(&tree).unwrap().with_context(context);
        engine.run_from_id(&id, true).unwrap();
        assert_eq!(*log.lock(), vec![r#"{"a":1}"#.to_string()]);

        // Without a print log the node still succeeds
        engine.set_context(Default::default());
        engine.run_from_id(&id, true).unwrap();
        assert_eq!(log.lock().len(), 1);
    }
}
