//! Node type definitions
//!
//! A [`NodeDefinition`] is a plain record: metadata, port factories,
//! optional lifecycle hooks and a `calculate` function. Definitions are
//! registered into a [`NodeTree`](crate::tree::NodeTree) by id.
//!
//! # Example
//!
//! ```ignore
//! use node_runtime::{define_node, NodeInterface};
//!
//! let add = define_node("add", "math")
//!     .title("Add")
//!     .input("a", || NodeInterface::number("A"))
//!     .input("b", || NodeInterface::number("B"))
//!     .output("sum", || NodeInterface::number("Sum"))
//!     .calculate(|eval| {
//!         let a = eval.number("a");
//!         let b = eval.number("b");
//!         Ok([("sum".to_string(), serde_json::json!(a + b))].into())
//!     })
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;

use crate::engine::Evaluation;
use crate::error::Result;
use crate::interface::NodeInterface;
use crate::node::Node;
use crate::tree::NodeTree;
use crate::types::{FlowMode, PortName, PortValues};
use crate::update::NodeUpdateEvent;

/// Produces a fresh interface for each node instance
pub type InterfaceFactory = Arc<dyn Fn() -> NodeInterface + Send + Sync>;

/// Called once when an instance is inserted
pub type OnCreateHook = Arc<dyn Fn(&mut Node, &NodeTree) + Send + Sync>;

/// Called for connection changes touching an instance; may cancel the event
pub type OnUpdateHook = Arc<dyn Fn(&mut NodeUpdateEvent, &mut Node, &NodeTree) + Send + Sync>;

/// Maps the assembled inputs to output values
pub type CalculateFn = Arc<dyn Fn(&mut Evaluation<'_, '_>) -> Result<PortValues> + Send + Sync>;

/// Template for node instances of one type
#[derive(Clone)]
pub struct NodeDefinition {
    /// Unique type identifier (e.g., "add")
    pub id: String,
    /// Category for grouping in the palette
    pub category: String,
    /// Human-readable label
    pub title: String,
    /// Description of what the node does
    pub description: String,
    /// Flow pseudo-ports instances receive
    pub flow: FlowMode,
    /// Input port factories, in declaration order
    pub inputs: Vec<(PortName, InterfaceFactory)>,
    /// Output port factories, in declaration order
    pub outputs: Vec<(PortName, InterfaceFactory)>,
    pub on_create: Option<OnCreateHook>,
    pub on_update: Option<OnUpdateHook>,
    pub calculate: CalculateFn,
}

impl NodeDefinition {
    pub fn uses_flow(&self) -> bool {
        self.flow.uses_flow()
    }
}

impl fmt::Debug for NodeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("flow", &self.flow)
            .field("inputs", &self.inputs.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("outputs", &self.outputs.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("on_create", &self.on_create.is_some())
            .field("on_update", &self.on_update.is_some())
            .finish()
    }
}

/// Start building a node definition
pub fn define_node(id: impl Into<String>, category: impl Into<String>) -> NodeDefinitionBuilder {
    NodeDefinitionBuilder::new(id, category)
}

/// Fluent builder for [`NodeDefinition`]
pub struct NodeDefinitionBuilder {
    definition: NodeDefinition,
}

impl NodeDefinitionBuilder {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            definition: NodeDefinition {
                title: id.clone(),
                id,
                category: category.into(),
                description: String::new(),
                flow: FlowMode::None,
                inputs: Vec::new(),
                outputs: Vec::new(),
                on_create: None,
                on_update: None,
                calculate: Arc::new(no_outputs),
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.definition.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.definition.description = description.into();
        self
    }

    pub fn flow(mut self, flow: FlowMode) -> Self {
        self.definition.flow = flow;
        self
    }

    /// Add an input port. A port of the same name is replaced.
    pub fn input(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> NodeInterface + Send + Sync + 'static,
    ) -> Self {
        upsert_port(&mut self.definition.inputs, name.into(), Arc::new(factory));
        self
    }

    /// Add an output port. A port of the same name is replaced.
    pub fn output(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> NodeInterface + Send + Sync + 'static,
    ) -> Self {
        upsert_port(&mut self.definition.outputs, name.into(), Arc::new(factory));
        self
    }

    pub fn on_create(mut self, hook: impl Fn(&mut Node, &NodeTree) + Send + Sync + 'static) -> Self {
        self.definition.on_create = Some(Arc::new(hook));
        self
    }

    pub fn on_update(
        mut self,
        hook: impl Fn(&mut NodeUpdateEvent, &mut Node, &NodeTree) + Send + Sync + 'static,
    ) -> Self {
        self.definition.on_update = Some(Arc::new(hook));
        self
    }

    pub fn calculate(
        mut self,
        f: impl Fn(&mut Evaluation<'_, '_>) -> Result<PortValues> + Send + Sync + 'static,
    ) -> Self {
        self.definition.calculate = Arc::new(f);
        self
    }

    pub fn build(self) -> NodeDefinition {
        self.definition
    }
}

fn no_outputs(_: &mut Evaluation<'_, '_>) -> Result<PortValues> {
    Ok(PortValues::new())
}

fn upsert_port(ports: &mut Vec<(PortName, InterfaceFactory)>, name: PortName, factory: InterfaceFactory) {
    match ports.iter_mut().find(|(n, _)| *n == name) {
        Some(slot) => slot.1 = factory,
        None => ports.push((name, factory)),
    }
}

/// Link-time registration of a node definition.
///
/// ```ignore
/// inventory::submit!(node_runtime::NodeTypeFn(my_node::definition));
/// ```
pub struct NodeTypeFn(pub fn() -> NodeDefinition);

inventory::collect!(NodeTypeFn);

/// Every definition submitted with [`NodeTypeFn`] in the final binary
pub fn collected_definitions() -> Vec<NodeDefinition> {
    inventory::iter::<NodeTypeFn>
        .into_iter()
        .map(|f| (f.0)())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let def = define_node("sink", "output").build();
        assert_eq!(def.id, "sink");
        assert_eq!(def.title, "sink");
        assert_eq!(def.category, "output");
        assert_eq!(def.flow, FlowMode::None);
        assert!(def.inputs.is_empty() && def.outputs.is_empty());
        assert!(def.on_create.is_none() && def.on_update.is_none());
    }

    #[test]
    fn test_factories_produce_independent_interfaces() {
        let def = define_node("n", "test")
            .input("x", || NodeInterface::number("X"))
            .build();

        let factory = &def.inputs[0].1;
        let mut first = factory();
        let second = factory();
        first.value = Some(serde_json::json!(42));
        assert_eq!(second.value, Some(serde_json::json!(0)));
    }

    #[test]
    fn test_duplicate_port_replaces() {
        let def = define_node("n", "test")
            .input("x", || NodeInterface::number("First"))
            .input("x", || NodeInterface::text("Second"))
            .flow(FlowMode::InOut)
            .build();

        assert_eq!(def.inputs.len(), 1);
        assert_eq!((def.inputs[0].1)().title, "Second");
        assert!(def.uses_flow());
    }
}
