//! Runtime Nodes
//!
//! Built-in node types for the node runtime. Each node is a small
//! building block that can be composed into programs.
//!
//! # Categories
//!
//! - **Input**: run entry points and constants
//! - **Processing**: arithmetic and comparisons
//! - **Control**: branching, sequencing, loops and reroutes
//! - **Output**: nodes that hand values to the host

pub mod control;
pub mod input;
pub mod output;
pub mod processing;
pub mod setup;

// Re-export all nodes for convenience
pub use control::*;
pub use input::*;
pub use output::*;
pub use processing::*;
pub use setup::{print_log, setup_context, PrintLog};

use node_runtime::{NodeTree, Result};

/// Register every node type linked into the binary, built-ins included.
///
/// Returns the number of registered types.
pub fn register_builtins(tree: &mut NodeTree) -> Result<usize> {
    let count = tree.register_collected()?;
    log::debug!("Registered {} node types", count);
    Ok(count)
}
