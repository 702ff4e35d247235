//! Input nodes
//!
//! Run entry points and constant values.

mod number;
mod on_start;
mod text;

pub use number::NumberNode;
pub use on_start::OnStartNode;
pub use text::TextNode;
