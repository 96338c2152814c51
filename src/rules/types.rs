//! Rule representation produced by the evaluator and consumed by the
//! dependency graph builder.

use std::rc::Rc;

use crate::ast::{AssignOp, Location, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// `:` — prerequisites accumulate, recipe replaces.
    Single,
    /// `::` — each occurrence is a distinct rule instance for the target.
    Double,
}

/// One parsed (not yet merged) rule, as produced directly by the
/// evaluator from a `StatementKind::Rule`. Recipe lines stay unevaluated
/// `Value` trees (spec's "lazy Values" invariant) so automatic variables
/// and any rebinding of ordinary variables between rule declaration and
/// build time are picked up at recipe-execution time, not here.
#[derive(Debug, Clone)]
pub struct RawRule {
    pub loc: Location,
    pub outputs: Vec<String>,
    pub implicit_outputs: Vec<String>,
    pub kind: RuleKind,
    pub prereqs: Vec<String>,
    pub order_only_prereqs: Vec<String>,
    pub validations: Vec<String>,
    pub recipe: Vec<Rc<Value>>,
    pub is_suffix_rule: bool,
}

impl RawRule {
    pub fn is_pattern_rule(&self) -> bool {
        self.outputs.iter().any(|o| o.contains('%'))
    }
}

/// A `target: VAR = value` binding recorded independently of any
/// particular `Rule`, since its target list may name a pattern that
/// matches rules declared anywhere else in the makefile. Matched against
/// concrete/pattern-rule targets when the dependency graph resolves each
/// node.
#[derive(Debug, Clone)]
pub struct RuleVarBinding {
    pub loc: Location,
    pub target_pattern: String,
    pub name: String,
    pub rhs: Rc<Value>,
    pub op: AssignOp,
}

/// A fully merged rule for a single concrete output, after
/// [`crate::rules::merge`] has combined every `RawRule` touching it.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub outputs: Vec<String>,
    pub implicit_outputs: Vec<String>,
    pub prereqs: Vec<String>,
    pub order_only_prereqs: Vec<String>,
    pub validations: Vec<String>,
    pub recipe: Vec<Rc<Value>>,
    pub recipe_loc: Option<Location>,
    pub is_double_colon: bool,
}
