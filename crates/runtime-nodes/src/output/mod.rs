//! Output nodes

mod print;

pub use print::PrintNode;
