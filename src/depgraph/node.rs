//! A single node in the dependency graph: one concrete target and the
//! rule (if any) that builds it.

use std::rc::Rc;

use crate::ast::{AssignOp, Location, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Target visited and its mtime recorded (or `Missing` if it
    /// doesn't exist on disk and nothing builds it).
    Done,
    /// Currently being visited — seeing this again means a dependency
    /// cycle.
    Processing,
    Missing,
}

#[derive(Debug, Clone)]
pub struct DepNode {
    pub target: String,
    pub prereqs: Vec<String>,
    pub order_only_prereqs: Vec<String>,
    pub validations: Vec<String>,
    /// Extra outputs this rule also produces (`.KATI_IMPLICIT_OUTPUTS`),
    /// beyond the one this node is keyed on.
    pub implicit_outputs: Vec<String>,
    /// Recipe lines, still unevaluated: expanded against the environment
    /// (with automatic variables and `rule_vars` scoped in) at execution
    /// time, never before.
    pub recipe: Vec<Rc<Value>>,
    pub recipe_loc: Option<Location>,
    pub is_phony: bool,
    pub is_double_colon: bool,
    /// `target: VAR = value` bindings that apply to this node, applied
    /// as a scope around recipe expansion.
    pub rule_vars: Vec<(String, Rc<Value>, AssignOp)>,
    /// Set by a `.KATI_RESTAT:` special target: treat the recipe as
    /// "restat" (rebuild dependents only if this target's content
    /// actually changed), matching ninja's restat edges.
    pub is_restat: bool,
    /// Whether this is the goal the engine would pick with no target
    /// arguments (GNU Make's "first non-dot-prefixed rule" default).
    pub is_default_target: bool,
    /// The `%` stem used to instantiate this node from a pattern rule,
    /// bound as `$*` while its recipe runs.
    pub stem: Option<String>,
}

impl DepNode {
    pub fn has_recipe(&self) -> bool {
        !self.recipe.is_empty()
    }
}
