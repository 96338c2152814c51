//! Dependency graph construction: resolves prerequisites, memoizes
//! visited targets, and detects cycles.

pub mod builder;
pub mod node;

pub use builder::{Builder, Graph};
pub use node::{DepNode, NodeState};
