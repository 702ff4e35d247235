//! On Start Node
//!
//! Entry point of a run. Hosts start execution with
//! `ForwardEngine::run_from_type("on-start", true)`.

use node_runtime::{define_node, FlowMode, NodeDefinition};

/// Starts a flow chain. Has no ports besides `__flow_out`.
pub struct OnStartNode;

impl OnStartNode {
    pub const NODE_TYPE: &'static str = "on-start";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "events")
            .title("On Start")
            .description("Entry point of a run")
            .flow(FlowMode::Out)
            .calculate(|eval| {
                log::debug!("OnStartNode {}: run started", eval.node_id());
                Ok(Default::default())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(OnStartNode::definition));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition() {
        let def = OnStartNode::definition();
        assert_eq!(def.id, "on-start");
        assert_eq!(def.flow, FlowMode::Out);
        assert!(def.inputs.is_empty() && def.outputs.is_empty());
    }
}
