//! Expands a [`Value`] tree against an [`Environment`].
//!
//! Recursive variables are re-evaluated on every reference; simple
//! variables are already flattened strings. This mirrors the
//! teacher's `InterpreterState`-plus-free-function style
//! (`src/interpreter/interpreter.rs`) rather than bundling evaluation
//! methods onto the environment itself, since the evaluator also needs
//! per-call transient state (recursion depth, the active automatic
//! variables) that has no business living in the variable table.

use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::{Error, Result};
use crate::functions::lookup;
use crate::vars::automatic::AutomaticVars;
use crate::vars::{Environment, Flavor, Origin};

/// Recursive variable expansion deeper than this almost certainly means
/// a self-referential variable; GNU Make's own limit is used here too.
const MAX_EVAL_DEPTH: usize = 1000;

pub struct Evaluator<'a> {
    pub env: &'a mut Environment,
    pub loc: Location,
    depth: usize,
    pub automatic: Option<AutomaticVars>,
    /// Names of recursive variables currently being expanded on this call
    /// stack, so a self-referential variable is caught the moment it
    /// reappears instead of only once `MAX_EVAL_DEPTH` is exhausted.
    in_progress: Vec<String>,
    /// Rules discovered by a nested `$(eval ...)` while expanding this
    /// value, folded into the caller's rule set once the enclosing
    /// statement finishes executing.
    pub pending_rules: Vec<crate::rules::types::RawRule>,
    /// Target-scoped variable bindings discovered the same way.
    pub pending_rule_vars: Vec<crate::rules::types::RuleVarBinding>,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a mut Environment) -> Self {
        Self { env, loc: Location::builtin(), depth: 0, automatic: None, in_progress: Vec::new(), pending_rules: Vec::new(), pending_rule_vars: Vec::new() }
    }

    pub fn with_loc(env: &'a mut Environment, loc: Location) -> Self {
        Self { env, loc, depth: 0, automatic: None, in_progress: Vec::new(), pending_rules: Vec::new(), pending_rule_vars: Vec::new() }
    }

    pub fn eval_value(&mut self, value: &Rc<Value>) -> Result<String> {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            self.depth -= 1;
            return Err(Error::eval(self.loc.clone(), "variable recursion too deep"));
        }
        let result = self.eval_value_inner(value);
        self.depth -= 1;
        result
    }

    fn eval_value_inner(&mut self, value: &Value) -> Result<String> {
        match value {
            Value::Literal(s) => Ok(s.clone()),
            Value::List(parts) => {
                let mut out = String::new();
                for p in parts {
                    out.push_str(&self.eval_value(p)?);
                }
                Ok(out)
            }
            Value::SymRef(name) => self.lookup_var(name),
            Value::VarRef(name_expr) => {
                let name = self.eval_value(name_expr)?;
                self.lookup_var(&name)
            }
            Value::VarSubst { name, pattern, subst } => {
                let name = self.eval_value(name)?;
                let value = self.lookup_var(&name)?;
                let pattern = self.eval_value(pattern)?;
                let pattern = if pattern.contains('%') { pattern } else { format!("%{}", pattern) };
                let subst = self.eval_value(subst)?;
                let words = crate::util::split_words(&value);
                Ok(crate::util::join_words(
                    words.into_iter().map(|w| crate::util::patsubst_one(&pattern, &subst, w)),
                ))
            }
            Value::Func { name, args } => self.call_function(name, args),
        }
    }

    /// `$1`..`$9` and named `$(call)` arguments take priority over
    /// globals, matching the teacher's local-scope-before-global lookup
    /// order in `Environment::lookup_positional`-style shadowing.
    /// Automatic variables (`$@`, `$<`, ...) come next, then ordinary
    /// globals.
    pub fn lookup_var(&mut self, name: &str) -> Result<String> {
        if let Some(v) = self.env.lookup_positional(name) {
            return Ok(v.to_string());
        }
        if let Some(av) = &self.automatic {
            if let Some(v) = av.resolve(name) {
                return Ok(v);
            }
        }
        let var = match self.env.get(name) {
            None => return Ok(String::new()),
            Some(v) => v.clone(),
        };
        if let Some(allowed) = &var.visibility_prefixes {
            if !allowed.iter().any(|p| self.loc.filename.starts_with(p.as_str())) {
                return Err(Error::eval(self.loc.clone(), format!("variable '{}' is not visible from '{}'", name, self.loc.filename)));
            }
        }
        if let Some(msg) = &var.obsolete {
            return Err(Error::eval(self.loc.clone(), format!("obsolete variable '{}' referenced: {}", name, msg)));
        }
        if let Some(msg) = &var.deprecated {
            eprintln!("{}: warning: variable '{}' is deprecated: {}", self.loc, name, msg);
        }
        match var.payload {
            crate::vars::Payload::Simple(s) => Ok(s.to_string()),
            crate::vars::Payload::Recursive(expr) => {
                if self.in_progress.iter().any(|n| n == name) {
                    return Err(Error::eval(self.loc.clone(), format!("Recursive variable '{}' references itself (eventually)", name)));
                }
                self.in_progress.push(name.to_string());
                let result = self.eval_value(&expr);
                self.in_progress.pop();
                result
            }
        }
    }

    fn call_function(&mut self, name: &str, args: &[Rc<Value>]) -> Result<String> {
        let spec = lookup(name).ok_or_else(|| Error::eval(self.loc.clone(), format!("unknown function '{}'", name)))?;
        let loc = self.loc.clone();
        (spec.func)(self, &loc, args)
    }

    pub fn eval_args(&mut self, args: &[Rc<Value>]) -> Result<Vec<String>> {
        args.iter().map(|a| self.eval_value(a)).collect()
    }

    pub fn flavor_of(&self, name: &str) -> Flavor {
        if self.env.lookup_positional(name).is_some() {
            return Flavor::Simple;
        }
        if self.automatic.as_ref().is_some_and(|av| av.resolve(name).is_some()) {
            return Flavor::Automatic;
        }
        match self.env.get(name) {
            None => Flavor::Undefined,
            Some(v) => v.flavor(),
        }
    }

    pub fn origin_of(&self, name: &str) -> Origin {
        if self.automatic.as_ref().is_some_and(|av| av.resolve(name).is_some()) {
            return Origin::Automatic;
        }
        match self.env.get(name) {
            None => Origin::Undefined,
            Some(v) => v.origin,
        }
    }

    pub fn raw_value(&self, name: &str) -> Option<String> {
        self.env.get(name).map(|v| match &v.payload {
            crate::vars::Payload::Simple(s) => s.to_string(),
            crate::vars::Payload::Recursive(expr) => render_unexpanded(expr),
        })
    }
}

/// Render a `Value` tree back to Make source text without expanding
/// variable references, for `$(value VAR)`.
fn render_unexpanded(value: &Value) -> String {
    match value {
        Value::Literal(s) => s.clone(),
        Value::List(parts) => parts.iter().map(|p| render_unexpanded(p)).collect(),
        Value::SymRef(name) => format!("$({})", name),
        Value::VarRef(name) => format!("$({})", render_unexpanded(name)),
        Value::VarSubst { name, pattern, subst } => {
            format!("$({}:{}={})", render_unexpanded(name), render_unexpanded(pattern), render_unexpanded(subst))
        }
        Value::Func { name, args } => {
            let rendered: Vec<String> = args.iter().map(|a| render_unexpanded(a)).collect();
            format!("$({} {})", name, rendered.join(","))
        }
    }
}
