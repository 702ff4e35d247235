//! Branch Node
//!
//! Fires one of two flow outputs depending on a boolean condition.

use node_runtime::{define_node, FlowMode, NodeDefinition, NodeInterface, PortValues};

/// Branch Node
///
/// # Inputs
/// - `condition` - boolean deciding the branch
///
/// # Outputs
/// - `true` - flow fired when the condition holds
/// - `false` - flow fired otherwise
pub struct BranchNode;

impl BranchNode {
    pub const NODE_TYPE: &'static str = "branch";
    /// Port ID for the condition input
    pub const PORT_CONDITION: &'static str = "condition";
    /// Port ID for the flow fired on true
    pub const PORT_TRUE: &'static str = "true";
    /// Port ID for the flow fired on false
    pub const PORT_FALSE: &'static str = "false";

    pub fn definition() -> NodeDefinition {
        define_node(Self::NODE_TYPE, "control")
            .title("Branch")
            .description("Continues on the true or false flow")
            .flow(FlowMode::In)
            .input(Self::PORT_CONDITION, || NodeInterface::boolean("Condition"))
            .output(Self::PORT_TRUE, || NodeInterface::flow("True"))
            .output(Self::PORT_FALSE, || NodeInterface::flow("False"))
            .calculate(|eval| {
                let condition = eval.boolean(Self::PORT_CONDITION);
                log::debug!("BranchNode {}: condition={}", eval.node_id(), condition);

                let port = if condition {
                    Self::PORT_TRUE
                } else {
                    Self::PORT_FALSE
                };
                eval.fire(port, None)?;
                Ok(PortValues::new())
            })
            .build()
    }
}

inventory::submit!(node_runtime::NodeTypeFn(BranchNode::definition));
