//! Node Runtime - typed node graphs with dataflow and flow execution
//!
//! This crate provides the graph model and the execution engine for
//! node-based visual programs. It supports:
//!
//! - Interface types with one-way conversions and an `ANY` wildcard
//! - Node types registered as plain definitions with lifecycle hooks
//! - A node tree that keeps connections valid while it is edited
//! - Forward execution mixing on-demand data pulls with flow pushes
//! - Compressed snapshot-based undo/redo
//!
//! # Architecture
//!
//! - `NodeTree`: owns node types, nodes and connections
//! - `ForwardEngine`: evaluates a tree with a per-run output cache
//! - `Flow`: handle a node fires to continue execution downstream
//! - `EventSink`: run progress reporting (not tied to any UI)
//!
//! # Example
//!
//! ```ignore
//! use node_runtime::{define_node, ForwardEngine, NodeInterface, NodeTree};
//!
//! let mut tree = NodeTree::new();
//! tree.register_node_type(
//!     define_node("double", "math")
//!         .input("x", || NodeInterface::number("X"))
//!         .output("y", || NodeInterface::number("Y"))
//!         .calculate(|eval| Ok([("y".to_string(), (eval.number("x") * 2.0).into())].into()))
//!         .build(),
//! )?;
//! let node = tree.insert_node_at("double", (0.0, 0.0))?;
//!
//! let mut engine = ForwardEngine::new(&tree)?;
//! engine.run_from_id(&node, true)?;
//! ```

pub mod context;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod events;
pub mod interface;
pub mod interface_type;
pub mod node;
pub mod snapshot;
pub mod tree;
pub mod types;
pub mod undo;
pub mod update;
pub mod validation;

// Re-export key types
pub use context::{context_keys, ExecutionContext};
pub use descriptor::{
    collected_definitions, define_node, CalculateFn, NodeDefinition, NodeDefinitionBuilder, NodeTypeFn,
};
pub use engine::{Evaluation, Flow, ForwardEngine};
pub use error::{NodeRuntimeError, Result};
pub use events::{EventError, EventSink, NullEventSink, RunEvent, VecEventSink};
pub use interface::NodeInterface;
pub use interface_type::{
    BaseTypes, Compatibility, ConversionRule, InterfaceTypeRef, NodeInterfaceType, ANY_TYPE_ID,
};
pub use node::Node;
pub use snapshot::{NodeSnapshot, TreeSnapshot};
pub use tree::{NodeTree, TreeConfig};
pub use types::{Connection, ConnectionId, FlowMode, NodeUid, PortName, PortValues, Position, FLOW_IN, FLOW_OUT};
pub use undo::UndoHistory;
pub use update::{NodeUpdateEvent, NodeUpdateKind};
pub use validation::{validate_snapshot, validate_tree, ValidationError};
