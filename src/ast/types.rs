//! Core AST types: locations, lazy [`Value`] trees and [`Statement`]s.
//!
//! `Value` is deliberately a tagged enum rather than a trait object tree:
//! every evaluation-time branch is a `match` in `eval::evaluator`, which
//! keeps the dispatch cost (and the borrow graph against the variable
//! environment) predictable.

use std::fmt;
use std::rc::Rc;

/// Source location, attached to every statement and value for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub filename: Rc<str>,
    pub lineno: u32,
}

impl Location {
    pub fn new(filename: impl Into<Rc<str>>, lineno: u32) -> Self {
        Self { filename: filename.into(), lineno }
    }

    /// Location for built-in/synthetic statements (automatic variables,
    /// suffix-rule desugaring) that have no file position of their own.
    pub fn builtin() -> Self {
        Self { filename: Rc::from("<builtin>"), lineno: 0 }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.lineno)
    }
}

/// `=`, `:=`, `+=`, `?=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Recursive,
    Simple,
    Append,
    Conditional,
}

/// `override`/`export` modifiers attached to an assignment statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssignDirective {
    pub is_override: bool,
    pub is_export: bool,
}

/// `ifeq`/`ifneq`/`ifdef`/`ifndef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondOp {
    IfEq,
    IfNeq,
    IfDef,
    IfNdef,
}

/// A lazy, tree-shaped expression. Concatenation is represented by `List`
/// and only flattens to a string at evaluation time.
///
/// Invariant: `Literal` is the only variant for which [`Value::is_literal`]
/// returns true.
#[derive(Debug, Clone)]
pub enum Value {
    Literal(String),
    /// Concatenation of children, left to right, with no separator.
    List(Vec<Rc<Value>>),
    /// Direct symbol lookup: `$X` or `$(X)` where `X` has no nested `$`.
    SymRef(String),
    /// Variable reference whose name must itself be expanded: `$($(X))`.
    VarRef(Rc<Value>),
    /// `$(VAR:pattern=subst)`.
    VarSubst {
        name: Rc<Value>,
        pattern: Rc<Value>,
        subst: Rc<Value>,
    },
    /// Call into the function registry.
    Func { name: String, args: Vec<Rc<Value>> },
}

impl Value {
    pub fn is_literal(&self) -> bool {
        matches!(self, Value::Literal(_))
    }

    pub fn literal(s: impl Into<String>) -> Rc<Value> {
        Rc::new(Value::Literal(s.into()))
    }

    pub fn empty() -> Rc<Value> {
        Value::literal(String::new())
    }

    /// Concatenate a sequence of values, collapsing single-element and
    /// empty lists as a minor evaluation-time optimisation (the spec
    /// only requires that flattening happen "at evaluation", not that
    /// the tree be unflattened beforehand).
    pub fn concat(mut parts: Vec<Rc<Value>>) -> Rc<Value> {
        match parts.len() {
            0 => Value::empty(),
            1 => parts.pop().unwrap(),
            _ => Rc::new(Value::List(parts)),
        }
    }
}

/// A single parsed line (or directive block), always tagged with the
/// location it was parsed from.
#[derive(Debug, Clone)]
pub struct Statement {
    pub loc: Location,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(loc: Location, kind: StatementKind) -> Self {
        Self { loc, kind }
    }
}

#[derive(Debug, Clone)]
pub enum StatementKind {
    Rule {
        lhs: Rc<Value>,
        /// Prerequisite text (everything between `:`/`::` and the
        /// optional `;`), unevaluated.
        prereqs: Rc<Value>,
        /// Recipe lines in source order: an inline `; recipe` (if
        /// present) first, then every TAB-prefixed line absorbed
        /// after this statement by the parser.
        recipe: Vec<Rc<Value>>,
        is_double_colon: bool,
    },
    /// `target ...: VAR = value` — a variable binding scoped to the
    /// listed targets' recipe expansion.
    RuleVar {
        targets: Rc<Value>,
        lhs: Rc<Value>,
        rhs: Rc<Value>,
        orig_rhs: String,
        op: AssignOp,
        is_double_colon: bool,
    },
    Assign {
        lhs: Rc<Value>,
        rhs: Rc<Value>,
        orig_rhs: String,
        op: AssignOp,
        directive: AssignDirective,
        is_final: bool,
    },
    Command {
        expr: Rc<Value>,
    },
    If {
        op: CondOp,
        lhs: Rc<Value>,
        rhs: Option<Rc<Value>>,
        true_stmts: Vec<Statement>,
        false_stmts: Vec<Statement>,
    },
    Include {
        expr: Rc<Value>,
        must_exist: bool,
    },
    Export {
        expr: Rc<Value>,
        is_export: bool,
    },
    ParseError {
        message: String,
    },
}
