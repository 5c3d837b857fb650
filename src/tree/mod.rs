//! Generic ordered tree and forest construction.

pub mod builder;
pub mod node;

pub use builder::create_forest;
pub use node::{Ancestors, Descendants, Forest, NodeId};
