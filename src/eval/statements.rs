//! Executes a parsed `Statement` tree against an `Environment`,
//! accumulating `RawRule`s and diagnostics as it goes.
//!
//! This is the free-function-over-shared-state style the teacher uses
//! for its top-level execution loop (`src/interpreter/interpreter.rs`),
//! rather than a method on `Evaluator` itself: the executor needs to
//! recurse into `include`d files, which needs filesystem access the
//! pure expression evaluator has no business carrying.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::ast::{AssignOp, CondOp, Location, Statement, StatementKind, Value};
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::rules::types::{RawRule, RuleKind, RuleVarBinding};
use crate::vars::{Environment, Origin};

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub loc: Location,
    pub message: String,
}

/// Accumulated side effects of executing a statement tree: the rules it
/// defined, the target-scoped variable bindings it recorded, and any
/// non-fatal diagnostics (`$(warning ...)`, preserved parse errors).
pub struct ExecOutput {
    pub rules: Vec<RawRule>,
    pub rule_vars: Vec<RuleVarBinding>,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct StatementExecutor<'a> {
    pub env: &'a mut Environment,
    pub rules: Vec<RawRule>,
    pub rule_vars: Vec<RuleVarBinding>,
    pub diagnostics: Vec<Diagnostic>,
    /// Directories searched for non-absolute `include`s; just the
    /// invoking makefile's directory by default.
    pub include_dirs: Vec<PathBuf>,
    depth: usize,
}

const MAX_INCLUDE_DEPTH: usize = 64;

impl<'a> StatementExecutor<'a> {
    pub fn new(env: &'a mut Environment) -> Self {
        Self { env, rules: Vec::new(), rule_vars: Vec::new(), diagnostics: Vec::new(), include_dirs: vec![PathBuf::from(".")], depth: 0 }
    }

    pub fn into_output(self) -> ExecOutput {
        ExecOutput { rules: self.rules, rule_vars: self.rule_vars, diagnostics: self.diagnostics }
    }

    /// Fold rules and rule-var bindings a `$(eval ...)` defined while
    /// expanding a value into this executor's own accumulator.
    fn drain_pending(&mut self, ev: &mut Evaluator) {
        self.rules.append(&mut ev.pending_rules);
        self.rule_vars.append(&mut ev.pending_rule_vars);
    }

    pub fn exec_all(&mut self, stmts: &[Statement]) -> Result<()> {
        for s in stmts {
            self.exec_one(s)?;
        }
        Ok(())
    }

    fn exec_one(&mut self, stmt: &Statement) -> Result<()> {
        match &stmt.kind {
            StatementKind::Assign { lhs, rhs, orig_rhs, op, directive, is_final: _ } => {
                self.exec_assign(&stmt.loc, lhs, rhs, orig_rhs, *op, directive.is_override, directive.is_export)
            }
            StatementKind::RuleVar { targets, lhs, rhs, orig_rhs, op, is_double_colon: _ } => {
                // Target-scoped variables are resolved at recipe-execution
                // time against the owning rule, not here; recording them
                // eagerly as ordinary globals would leak them to every
                // other target. We evaluate the target list and the
                // variable name now so parse errors surface immediately,
                // and keep the right-hand side as a lazy `Value` for the
                // builder to push as a scope around the recipe.
                let mut ev = Evaluator::with_loc(self.env, stmt.loc.clone());
                let targets_text = ev.eval_value(targets)?;
                let name = ev.eval_value(lhs)?;
                self.drain_pending(&mut ev);
                let _ = orig_rhs;
                for target_word in crate::util::split_words(&targets_text) {
                    self.rule_vars.push(RuleVarBinding {
                        loc: stmt.loc.clone(),
                        target_pattern: target_word.to_string(),
                        name: name.clone(),
                        rhs: rhs.clone(),
                        op: *op,
                    });
                }
                Ok(())
            }
            StatementKind::Rule { lhs, prereqs, recipe, is_double_colon } => self.exec_rule(&stmt.loc, lhs, prereqs, recipe, *is_double_colon),
            StatementKind::Command { expr } => {
                // A command outside any rule's recipe; Make ignores empty
                // ones and treats non-empty ones as a parse error in real
                // GNU Make. We mirror that by recording a diagnostic
                // instead of aborting the whole parse.
                let mut ev = Evaluator::with_loc(self.env, stmt.loc.clone());
                let text = ev.eval_value(expr)?;
                self.drain_pending(&mut ev);
                if !text.trim().is_empty() {
                    self.diagnostics.push(Diagnostic { loc: stmt.loc.clone(), message: format!("commands commence before first target: {}", text) });
                }
                Ok(())
            }
            StatementKind::If { op, lhs, rhs, true_stmts, false_stmts } => {
                if self.eval_cond(&stmt.loc, *op, lhs, rhs.as_ref())? {
                    self.exec_all(true_stmts)
                } else {
                    self.exec_all(false_stmts)
                }
            }
            StatementKind::Include { expr, must_exist } => self.exec_include(&stmt.loc, expr, *must_exist),
            StatementKind::Export { expr, is_export } => {
                let mut ev = Evaluator::with_loc(self.env, stmt.loc.clone());
                let names = ev.eval_value(expr)?;
                self.drain_pending(&mut ev);
                for name in crate::util::split_words(&names) {
                    self.env.mark_export(name, *is_export);
                }
                Ok(())
            }
            StatementKind::ParseError { message } => {
                self.diagnostics.push(Diagnostic { loc: stmt.loc.clone(), message: message.clone() });
                Ok(())
            }
        }
    }

    fn exec_assign(
        &mut self,
        loc: &Location,
        lhs: &Rc<Value>,
        rhs: &Rc<Value>,
        orig_rhs: &str,
        op: AssignOp,
        is_override: bool,
        is_export: bool,
    ) -> Result<()> {
        let mut ev = Evaluator::with_loc(self.env, loc.clone());
        let name = ev.eval_value(lhs)?;
        if name.trim().is_empty() {
            return Err(Error::parse(loc.clone(), "empty variable name"));
        }

        if let Some(existing) = self.env.get(&name) {
            if existing.is_readonly && !is_override {
                return Ok(());
            }
        }

        match op {
            AssignOp::Conditional => {
                if self.env.contains(&name) {
                    return Ok(());
                }
                self.bind_recursive(loc, &name, rhs.clone(), is_export);
            }
            AssignOp::Recursive => {
                self.bind_recursive(loc, &name, rhs.clone(), is_export);
            }
            AssignOp::Simple => {
                let mut ev = Evaluator::with_loc(self.env, loc.clone());
                let value = ev.eval_value(rhs)?;
                self.drain_pending(&mut ev);
                self.bind_simple(loc, &name, value, is_export);
            }
            AssignOp::Append => {
                let flavor = {
                    let mut ev = Evaluator::with_loc(self.env, loc.clone());
                    ev.flavor_of(&name)
                };
                match flavor {
                    crate::vars::Flavor::Simple => {
                        let existing = {
                            let mut ev = Evaluator::with_loc(self.env, loc.clone());
                            ev.lookup_var(&name)?
                        };
                        let mut ev = Evaluator::with_loc(self.env, loc.clone());
                        let appended = ev.eval_value(rhs)?;
                        self.drain_pending(&mut ev);
                        let combined = if existing.is_empty() { appended } else { format!("{} {}", existing, appended) };
                        self.bind_simple(loc, &name, combined, is_export);
                    }
                    crate::vars::Flavor::Undefined => {
                        self.bind_recursive(loc, &name, rhs.clone(), is_export);
                    }
                    crate::vars::Flavor::Recursive => {
                        let existing_expr = match self.env.get(&name) {
                            Some(v) => match &v.payload {
                                crate::vars::Payload::Recursive(e) => e.clone(),
                                crate::vars::Payload::Simple(_) => unreachable!(),
                            },
                            None => Value::empty(),
                        };
                        let combined = Value::concat(vec![existing_expr, Value::literal(" "), rhs.clone()]);
                        self.bind_recursive(loc, &name, combined, is_export);
                    }
                }
            }
        }
        let _ = orig_rhs;
        Ok(())
    }

    fn bind_recursive(&mut self, loc: &Location, name: &str, value: Rc<Value>, is_export: bool) {
        use crate::vars::Var;
        let mut var = Var::recursive(value, Origin::File);
        var.is_export = is_export;
        self.env.set_with_origin(name, var);
        self.env.set_def_loc(name, loc.clone());
    }

    fn bind_simple(&mut self, loc: &Location, name: &str, value: String, is_export: bool) {
        use crate::vars::Var;
        let mut var = Var::simple(value, Origin::File);
        var.is_export = is_export;
        self.env.set_with_origin(name, var);
        self.env.set_def_loc(name, loc.clone());
    }

    fn eval_cond(&mut self, loc: &Location, op: CondOp, lhs: &Rc<Value>, rhs: Option<&Rc<Value>>) -> Result<bool> {
        let mut ev = Evaluator::with_loc(self.env, loc.clone());
        match op {
            CondOp::IfDef => {
                let name = ev.eval_value(lhs)?;
                Ok(ev.env.contains(&name))
            }
            CondOp::IfNdef => {
                let name = ev.eval_value(lhs)?;
                Ok(!ev.env.contains(&name))
            }
            CondOp::IfEq => {
                let l = ev.eval_value(lhs)?;
                let r = ev.eval_value(rhs.unwrap())?;
                Ok(l == r)
            }
            CondOp::IfNeq => {
                let l = ev.eval_value(lhs)?;
                let r = ev.eval_value(rhs.unwrap())?;
                Ok(l != r)
            }
        }
    }

    fn exec_rule(&mut self, loc: &Location, lhs: &Rc<Value>, prereqs_expr: &Rc<Value>, recipe_exprs: &[Rc<Value>], is_double_colon: bool) -> Result<()> {
        let mut ev = Evaluator::with_loc(self.env, loc.clone());
        let targets_text = ev.eval_value(lhs)?;
        let outputs = crate::util::split_words(&targets_text).into_iter().map(|s| s.to_string()).collect::<Vec<_>>();
        self.drain_pending(&mut ev);

        let mut ev = Evaluator::with_loc(self.env, loc.clone());
        let prereqs_text = ev.eval_value(prereqs_expr)?;
        self.drain_pending(&mut ev);
        let (prereqs, order_only) = split_order_only(&prereqs_text);

        // Recipe lines stay as unevaluated `Value` trees: expanding them
        // now would freeze automatic variables and any `target: VAR = ...`
        // bindings to whatever they happen to be at rule-declaration time,
        // rather than at the moment the recipe actually runs.
        let recipe = recipe_exprs.to_vec();

        self.rules.push(RawRule {
            loc: loc.clone(),
            outputs,
            implicit_outputs: Vec::new(),
            kind: if is_double_colon { RuleKind::Double } else { RuleKind::Single },
            prereqs,
            order_only_prereqs: order_only,
            validations: Vec::new(),
            recipe,
            is_suffix_rule: false,
        });
        Ok(())
    }

    fn exec_include(&mut self, loc: &Location, expr: &Rc<Value>, must_exist: bool) -> Result<()> {
        if self.depth >= MAX_INCLUDE_DEPTH {
            return Err(Error::eval(loc.clone(), "include nested too deeply"));
        }
        let mut ev = Evaluator::with_loc(self.env, loc.clone());
        let names = ev.eval_value(expr)?;
        for name in crate::util::split_words(&names) {
            let path = self.resolve_include(name);
            let text = match std::fs::read_to_string(&path) {
                Ok(t) => t,
                Err(e) => {
                    if must_exist {
                        return Err(Error::io(loc.clone(), e));
                    } else {
                        continue;
                    }
                }
            };
            let stmts = crate::parser::parse(&text, &path.to_string_lossy());
            self.depth += 1;
            let result = self.exec_all(&stmts);
            self.depth -= 1;
            result?;
        }
        Ok(())
    }

    fn resolve_include(&self, name: &str) -> PathBuf {
        let p = Path::new(name);
        if p.is_absolute() || p.exists() {
            return p.to_path_buf();
        }
        for dir in &self.include_dirs {
            let candidate = dir.join(p);
            if candidate.exists() {
                return candidate;
            }
        }
        p.to_path_buf()
    }
}

fn split_order_only(text: &str) -> (Vec<String>, Vec<String>) {
    match text.find('|') {
        None => (crate::util::split_words(text).into_iter().map(|s| s.to_string()).collect(), Vec::new()),
        Some(pos) => {
            let normal = crate::util::split_words(&text[..pos]).into_iter().map(|s| s.to_string()).collect();
            let order = crate::util::split_words(&text[pos + 1..]).into_iter().map(|s| s.to_string()).collect();
            (normal, order)
        }
    }
}

/// Entry point used by `$(eval ...)`: parse and execute `text` against
/// the evaluator's own environment, returning any new rules and
/// target-scoped variable bindings rather than discarding them.
pub fn eval_into(env: &mut Environment, text: &str, loc: &Location) -> Result<(Vec<RawRule>, Vec<RuleVarBinding>)> {
    let stmts = crate::parser::parse(text, &loc.filename);
    let mut exec = StatementExecutor::new(env);
    exec.depth = 1; // eval-generated text cannot itself include further files without a path context
    exec.exec_all(&stmts)?;
    Ok((exec.rules, exec.rule_vars))
}
