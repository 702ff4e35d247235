//! Processing nodes
//!
//! Pure dataflow nodes: arithmetic and comparisons.

mod compare;
mod math;

pub use compare::{EqualsNode, GreaterThanNode};
pub use math::{AddNode, DivideNode, MultiplyNode, SubtractNode};
