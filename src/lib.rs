//! A Make-compatible build specification engine: parses a makefile,
//! evaluates its variables and rules, builds the dependency graph, and
//! runs stale targets' recipes.
//!
//! Mirrors the teacher's crate-root layout (`src/bash.rs` re-exported
//! from `lib.rs` alongside its supporting modules) with the pieces of
//! this engine's own pipeline in place of the bash interpreter's.

pub mod ast;
pub mod cli;
pub mod depgraph;
pub mod engine;
pub mod error;
pub mod eval;
pub mod exec;
pub mod functions;
pub mod parser;
pub mod rules;
pub mod util;
pub mod vars;

pub use engine::{Engine, EngineOptions};
pub use error::{Error, Result};
