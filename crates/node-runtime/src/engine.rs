//! Forward execution engine
//!
//! The engine evaluates a [`NodeTree`] in two interleaved ways:
//!
//! - **Data pull**: before a node runs, every flow-free upstream node
//!   whose outputs are not cached yet is evaluated on demand.
//! - **Flow push**: a run walks the `__flow_out` chain from a start node,
//!   and a node may fire one of its flow outputs from inside `calculate`
//!   to continue execution at the connected node.
//!
//! Outputs are cached per top-level run. Flow continuations share the
//! cache of the run that triggered them.
//!
//! Nodes that declare flow ports are never pulled: their outputs only
//! exist once the flow walk has reached them, so reading them earlier
//! fails with [`NodeRuntimeError::NodeNotRun`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use serde_json::Value;

use crate::context::ExecutionContext;
use crate::descriptor::NodeDefinition;
use crate::error::{NodeRuntimeError, Result};
use crate::events::{EventSink, NullEventSink, RunEvent};
use crate::node::Node;
use crate::tree::NodeTree;
use crate::types::{NodeUid, PortName, PortValues};

/// Handle to a flow output of the node being evaluated.
///
/// Firing it continues the current run at the node connected to the
/// output, reusing the run's cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flow {
    source: NodeUid,
    port: PortName,
    target: NodeUid,
}

impl Flow {
    /// Node that owns the flow output
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Node the continuation starts at
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Run the connected branch.
    ///
    /// `output` is merged into the cached outputs of the firing node first,
    /// so nodes in the branch can read values such as loop indices.
    pub fn fire(&self, eval: &mut Evaluation<'_, '_>, output: Option<PortValues>) -> Result<()> {
        eval.engine.fire_flow(self, output)
    }
}

/// Everything a `calculate` function sees while one node is evaluated
pub struct Evaluation<'e, 't> {
    engine: &'e mut ForwardEngine<'t>,
    node: &'t Node,
    inputs: PortValues,
    flows: HashMap<PortName, Flow>,
}

impl<'e, 't> Evaluation<'e, 't> {
    pub fn node_id(&self) -> &str {
        self.node.id()
    }

    /// The node instance, including its `data`
    pub fn node(&self) -> &'t Node {
        self.node
    }

    pub fn tree(&self) -> &'t NodeTree {
        self.engine.tree
    }

    /// Assembled input values: connected values converted to the port's
    /// type, otherwise the interface's current value, otherwise null
    pub fn inputs(&self) -> &PortValues {
        &self.inputs
    }

    pub fn input(&self, port: &str) -> Option<&Value> {
        self.inputs.get(port)
    }

    /// Input value, null when absent
    pub fn value(&self, port: &str) -> Value {
        self.inputs.get(port).cloned().unwrap_or(Value::Null)
    }

    /// Input read as a number. Booleans map to 1/0 and numeric strings are
    /// parsed; anything else reads as 0.
    pub fn number(&self, port: &str) -> f64 {
        match self.inputs.get(port) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::Bool(b)) => f64::from(u8::from(*b)),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Input read as text. Null reads as the empty string.
    pub fn text(&self, port: &str) -> String {
        match self.inputs.get(port) {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Input read as a boolean. Numbers are true when non-zero.
    pub fn boolean(&self, port: &str) -> bool {
        match self.inputs.get(port) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    /// Flow handle for a connected flow output
    pub fn flow(&self, port: &str) -> Option<Flow> {
        self.flows.get(port).cloned()
    }

    /// Fire a flow output. Unconnected outputs are a no-op.
    pub fn fire(&mut self, port: &str, output: Option<PortValues>) -> Result<()> {
        match self.flow(port) {
            Some(flow) => flow.fire(self, output),
            None => {
                log::trace!("Flow output {}.{} is not connected", self.node.id(), port);
                Ok(())
            }
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.engine.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.engine.context
    }
}

/// Evaluates the nodes of one tree
pub struct ForwardEngine<'t> {
    tree: &'t NodeTree,
    context: ExecutionContext,
    events: Arc<dyn EventSink>,
    cache: HashMap<NodeUid, PortValues>,
    /// Nodes currently inside `run_node`, innermost last
    evaluating: Vec<NodeUid>,
    run_id: String,
}

impl<'t> ForwardEngine<'t> {
    /// Create an engine over a flow-enabled tree
    pub fn new(tree: &'t NodeTree) -> Result<Self> {
        if !tree.supports_flow() {
            return Err(NodeRuntimeError::FlowDisabled);
        }
        Ok(Self {
            tree,
            context: ExecutionContext::new(),
            events: Arc::new(NullEventSink),
            cache: HashMap::new(),
            evaluating: Vec::new(),
            run_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Replace the context passed to every `calculate` call
    pub fn set_context(&mut self, context: ExecutionContext) {
        self.context = context;
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    pub fn tree(&self) -> &'t NodeTree {
        self.tree
    }

    /// Id of the current (or last) top-level run
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Cached outputs of a node from the current run
    pub fn cached_outputs(&self, node: &str) -> Option<&PortValues> {
        self.cache.get(node)
    }

    pub fn output_value(&self, node: &str, port: &str) -> Option<&Value> {
        self.cache.get(node)?.get(port)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Walk the flow chain starting at `node`.
    ///
    /// With `clear_cache` this is a fresh top-level run: the cache is wiped
    /// and start/completion events are emitted. Without it, the walk is a
    /// continuation of the current run.
    pub fn run_from_id(&mut self, node: &str, clear_cache: bool) -> Result<()> {
        if !clear_cache {
            return self.walk(node);
        }

        self.cache.clear();
        self.evaluating.clear();
        self.run_id = uuid::Uuid::new_v4().to_string();
        log::debug!("Run {} started at node {}", self.run_id, node);
        self.emit(RunEvent::RunStarted {
            run_id: self.run_id.clone(),
            node_id: node.to_string(),
        });

        let result = self.walk(node);
        match &result {
            Ok(()) => {
                log::debug!("Run {} completed", self.run_id);
                self.emit(RunEvent::RunCompleted {
                    run_id: self.run_id.clone(),
                });
            }
            Err(e) => {
                log::debug!("Run {} failed: {}", self.run_id, e);
                self.emit(RunEvent::RunFailed {
                    run_id: self.run_id.clone(),
                    error: e.to_string(),
                });
            }
        }
        result
    }

    /// Start a fresh run at every node of the given type (or only the first
    /// one, in insertion order). Stops at the first failing run.
    pub fn run_from_type(&mut self, type_id: &str, run_multiple: bool) -> Result<()> {
        let starts: Vec<NodeUid> = self
            .tree
            .nodes()
            .filter(|n| n.type_id() == type_id)
            .map(|n| n.id().to_string())
            .collect();
        if starts.is_empty() {
            log::debug!("No nodes of type '{}' to run", type_id);
        }

        for start in starts {
            self.run_from_id(&start, true)?;
            if !run_multiple {
                break;
            }
        }
        Ok(())
    }

    /// Evaluate exactly one node, pulling its unresolved dataflow inputs
    /// first. The outputs are cached and returned.
    pub fn run_node(&mut self, node_id: &str) -> Result<PortValues> {
        let tree = self.tree;
        let node = tree
            .node(node_id)
            .ok_or_else(|| NodeRuntimeError::NodeNotFound(node_id.to_string()))?;
        let definition = tree
            .get_node_type(node.type_id())
            .ok_or_else(|| NodeRuntimeError::NodeTypeNotFound(node.type_id().to_string()))?;

        self.evaluating.push(node_id.to_string());
        let result = self.evaluate(node, definition);
        self.evaluating.pop();
        result
    }

    fn walk(&mut self, start: &str) -> Result<()> {
        let mut current = Some(start.to_string());
        while let Some(node_id) = current {
            self.run_node(&node_id)?;
            current = self.tree.next_in_flow(&node_id);
        }
        Ok(())
    }

    fn evaluate(&mut self, node: &'t Node, definition: &'t NodeDefinition) -> Result<PortValues> {
        let tree = self.tree;
        log::debug!("Evaluating node {} ({})", node.id(), node.type_id());

        let mut inputs = PortValues::new();
        for (_, connection) in tree.data_dependencies(node.id()) {
            self.ensure_evaluated(&connection.source)?;

            let raw = self
                .output_value(&connection.source, &connection.source_port)
                .cloned()
                .unwrap_or(Value::Null);
            let source_iface = tree.get_interface(&connection.source, &connection.source_port, true);
            let value = match (source_iface, node.input(&connection.target_port)) {
                (Some(source), Some(target)) => {
                    source.interface_type.convert_to(&target.interface_type, raw)
                }
                _ => raw,
            };
            inputs.insert(connection.target_port, value);
        }
        for (name, iface) in node.inputs() {
            inputs
                .entry(name.clone())
                .or_insert_with(|| iface.value_or_null());
        }

        let mut flows = HashMap::new();
        for (name, iface) in node.outputs().filter(|(_, iface)| iface.is_flow()) {
            if let Some(target) = tree.flow_target(node.id(), name) {
                flows.insert(
                    name.clone(),
                    Flow {
                        source: node.id().to_string(),
                        port: name.clone(),
                        target,
                    },
                );
            } else {
                log::trace!("Flow output {}.{} ({}) is unconnected", node.id(), name, iface.title);
            }
        }

        let mut eval = Evaluation {
            engine: &mut *self,
            node,
            inputs,
            flows,
        };
        let outputs = (definition.calculate)(&mut eval)?;

        self.cache.insert(node.id().to_string(), outputs.clone());
        self.emit(RunEvent::NodeEvaluated {
            run_id: self.run_id.clone(),
            node_id: node.id().to_string(),
            outputs: outputs.clone(),
        });
        Ok(outputs)
    }

    /// Make sure a data source has cached outputs
    fn ensure_evaluated(&mut self, source: &str) -> Result<()> {
        if self.cache.contains_key(source) {
            log::trace!("Cache hit for node {}", source);
            return Ok(());
        }
        if self.tree.is_node_using_flow(source) {
            return Err(NodeRuntimeError::NodeNotRun {
                node_id: source.to_string(),
            });
        }
        if self.evaluating.iter().any(|id| id == source) {
            return Err(NodeRuntimeError::DataCycle {
                node_id: source.to_string(),
            });
        }

        log::trace!("Pulling data dependency {}", source);
        self.run_node(source).map(|_| ())
    }

    fn fire_flow(&mut self, flow: &Flow, output: Option<PortValues>) -> Result<()> {
        if let Some(output) = output {
            self.cache
                .entry(flow.source.clone())
                .or_default()
                .extend(output);
            self.invalidate_downstream(&flow.source);
        }

        log::debug!("Node {} fired '{}' into {}", flow.source, flow.port, flow.target);
        self.emit(RunEvent::FlowFired {
            run_id: self.run_id.clone(),
            source: flow.source.clone(),
            port: flow.port.clone(),
            target: flow.target.clone(),
        });
        self.run_from_id(&flow.target, false)
    }

    /// Drop cached outputs of flow-free nodes fed (directly or not) by `node`
    fn invalidate_downstream(&mut self, node: &str) {
        let tree = self.tree;
        let mut queue = VecDeque::from([node.to_string()]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            for (_, connection) in tree.connections() {
                if connection.source != current || connection.is_flow_edge() {
                    continue;
                }
                let target = &connection.target;
                if tree.is_node_using_flow(target) || !seen.insert(target.clone()) {
                    continue;
                }
                if self.cache.remove(target).is_some() {
                    log::trace!("Invalidated cached outputs of {}", target);
                }
                queue.push_back(target.clone());
            }
        }
    }

    fn emit(&self, event: RunEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver run event: {}", e);
        }
    }
}
