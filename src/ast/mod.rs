//! Abstract Syntax Tree for the Make dialect.
//!
//! Mirrors the grammar described in the specification: a flat list of
//! [`Statement`]s, each holding lazily-evaluated [`Value`] trees.

pub mod types;

pub use types::*;
