//! Control nodes
//!
//! Nodes that steer flow execution, plus the reroute helper.

mod branch;
mod repeat;
mod reroute;
mod sequence;

pub use branch::BranchNode;
pub use repeat::RepeatNode;
pub use reroute::RerouteNode;
pub use sequence::SequenceNode;
