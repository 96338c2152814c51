//! Walks the dependency graph, decides which targets are stale, and
//! runs their recipes.
//!
//! The teacher's interpreter simulates command execution entirely
//! in-memory (`src/commands/`); a build engine has to actually touch
//! the filesystem and spawn real processes for its staleness checks to
//! mean anything, so this module is grounded instead on the plain
//! `std::process::Command` dispatch pattern used by `nextest-runner`
//! (`other_examples/.../test_command.rs`) — one blocking `.status()`
//! call per recipe line, same as GNU Make's own execution model.

use std::fs;
use std::process::Command;
use std::time::SystemTime;

use crate::ast::AssignOp;
use crate::depgraph::{DepNode, Graph};
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::vars::automatic::AutomaticVars;
use crate::vars::{Environment, Var};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// `-n`: print recipes without running them.
    pub dry_run: bool,
    /// `-s`: suppress recipe echoing globally, independent of `@`.
    pub silent: bool,
    /// `-k`: keep building unrelated targets after a failure.
    pub keep_going: bool,
    /// `-B`: treat every target as out of date.
    pub always_make: bool,
}

struct RecipeLine {
    silent: bool,
    ignore_error: bool,
    text: String,
}

fn parse_recipe_line(raw: &str) -> RecipeLine {
    let mut chars = raw.chars();
    let mut silent = false;
    let mut ignore_error = false;
    let mut rest = raw;
    loop {
        match chars.clone().next() {
            Some('@') => {
                silent = true;
                chars.next();
                rest = chars.as_str();
            }
            Some('-') => {
                ignore_error = true;
                chars.next();
                rest = chars.as_str();
            }
            Some('+') => {
                chars.next();
                rest = chars.as_str();
            }
            _ => break,
        }
    }
    RecipeLine { silent, ignore_error, text: rest.to_string() }
}

fn mtime(path: &str) -> Option<SystemTime> {
    fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

/// Whether `node` needs rebuilding: phony, missing, or older than any
/// prerequisite (order-only prerequisites only trigger a build if they
/// themselves don't exist yet).
fn is_stale(node: &DepNode, graph: &Graph, always_make: bool) -> bool {
    if always_make || node.is_phony {
        return true;
    }
    let target_time = match mtime(&node.target) {
        None => return true,
        Some(t) => t,
    };
    for p in &node.prereqs {
        let stale_prereq = graph.nodes.get(p).map(|n| n.is_phony).unwrap_or(false);
        if stale_prereq {
            return true;
        }
        match mtime(p) {
            None => return true,
            Some(pt) if pt > target_time => return true,
            _ => {}
        }
    }
    for p in &node.order_only_prereqs {
        if mtime(p).is_none() {
            return true;
        }
    }
    false
}

pub struct Executor<'a> {
    graph: &'a Graph,
    env: &'a mut Environment,
    options: ExecOptions,
}

impl<'a> Executor<'a> {
    pub fn new(graph: &'a Graph, env: &'a mut Environment, options: ExecOptions) -> Self {
        Self { graph, env, options }
    }

    /// Build every target in `graph.order`, which is already a valid
    /// topological order of the requested goals' transitive closure.
    pub fn run(&mut self) -> Result<()> {
        let mut failed = false;
        for target in self.graph.order.clone() {
            let node = &self.graph.nodes[&target];
            if !node.has_recipe() {
                continue;
            }
            if !is_stale(node, self.graph, self.options.always_make) {
                continue;
            }
            if let Err(e) = run_recipe(self.env, node, self.options) {
                if self.options.keep_going {
                    eprintln!("{}", e);
                    failed = true;
                    continue;
                }
                return Err(e);
            }
        }
        if failed {
            return Err(Error::exec("keep-going build had failing targets", 2));
        }
        Ok(())
    }

    /// Build a single node if it's stale, for use by the parallel
    /// dispatcher which has already resolved ordering itself.
    pub fn run_one(&mut self, node: &DepNode) -> Result<()> {
        if !is_stale(node, self.graph, self.options.always_make) {
            return Ok(());
        }
        run_recipe(self.env, node, self.options)
    }
}

fn automatic_vars(node: &DepNode) -> AutomaticVars {
    let newer_prereqs: Vec<String> = node
        .prereqs
        .iter()
        .filter(|p| match (mtime(&node.target), mtime(p)) {
            (Some(t), Some(pt)) => pt > t,
            _ => true,
        })
        .cloned()
        .collect();
    AutomaticVars {
        targets: vec![node.target.clone()],
        first_prereq: node.prereqs.first().cloned(),
        all_prereqs: node.prereqs.clone(),
        newer_prereqs,
        stem: node.stem.clone(),
    }
}

/// Binds a node's `target: VAR = value` bindings as a temporary
/// override of the global environment, evaluated against it so a
/// binding can itself reference other variables. Returns the prior
/// state of every touched name, to be handed to [`pop_rule_vars`] once
/// the recipe has finished running.
fn push_rule_vars(env: &mut Environment, loc: &crate::ast::Location, rule_vars: &[(String, std::rc::Rc<crate::ast::Value>, AssignOp)]) -> Result<Vec<(String, Option<Var>)>> {
    let mut saved = Vec::with_capacity(rule_vars.len());
    for (name, rhs, op) in rule_vars {
        let old = env.get(name).cloned();
        match op {
            AssignOp::Simple => {
                let mut ev = Evaluator::with_loc(env, loc.clone());
                let value = ev.eval_value(rhs)?;
                env.set_simple(name.clone(), value);
            }
            AssignOp::Conditional if old.is_some() => {}
            AssignOp::Conditional | AssignOp::Recursive => {
                env.set_recursive(name.clone(), rhs.clone());
            }
            AssignOp::Append => {
                let existing = old.as_ref().map(|v| match &v.payload {
                    crate::vars::Payload::Simple(s) => s.to_string(),
                    crate::vars::Payload::Recursive(_) => String::new(),
                });
                let is_recursive = matches!(old.as_ref().map(|v| &v.payload), Some(crate::vars::Payload::Recursive(_)));
                if is_recursive {
                    let existing_expr = match old.as_ref().map(|v| &v.payload) {
                        Some(crate::vars::Payload::Recursive(e)) => e.clone(),
                        _ => unreachable!(),
                    };
                    let combined = crate::ast::Value::concat(vec![existing_expr, crate::ast::Value::literal(" "), rhs.clone()]);
                    env.set_recursive(name.clone(), combined);
                } else {
                    let mut ev = Evaluator::with_loc(env, loc.clone());
                    let appended = ev.eval_value(rhs)?;
                    let combined = match existing {
                        Some(e) if !e.is_empty() => format!("{} {}", e, appended),
                        _ => appended,
                    };
                    env.set_simple(name.clone(), combined);
                }
            }
        }
        saved.push((name.clone(), old));
    }
    Ok(saved)
}

fn pop_rule_vars(env: &mut Environment, saved: Vec<(String, Option<Var>)>) {
    for (name, old) in saved {
        env.restore(&name, old);
    }
}

fn run_recipe(env: &mut Environment, node: &DepNode, options: ExecOptions) -> Result<()> {
    let loc = node.recipe_loc.clone().unwrap_or_default();
    let saved = push_rule_vars(env, &loc, &node.rule_vars)?;
    let result = run_recipe_inner(env, node, options, &loc);
    pop_rule_vars(env, saved);
    result
}

fn run_recipe_inner(env: &mut Environment, node: &DepNode, options: ExecOptions, loc: &crate::ast::Location) -> Result<()> {
    let automatic = automatic_vars(node);
    let exported_names: Vec<String> = env.exported().map(|(name, _)| name.to_string()).collect();
    let mut exported = Vec::with_capacity(exported_names.len());
    for name in &exported_names {
        let mut ev = Evaluator::with_loc(env, loc.clone());
        exported.push((name.clone(), ev.lookup_var(name)?));
    }
    for raw_line in &node.recipe {
        let mut ev = Evaluator::with_loc(env, loc.clone());
        ev.automatic = Some(automatic.clone());
        let expanded_line = ev.eval_value(raw_line)?;
        for physical_line in expanded_line.split('\n') {
            let line = parse_recipe_line(physical_line);
            if line.text.trim().is_empty() {
                continue;
            }
            if !line.silent && !options.silent {
                println!("{}", line.text);
            }
            if options.dry_run {
                continue;
            }
            let status = Command::new("/bin/sh").arg("-c").arg(&line.text).envs(exported.iter().map(|(k, v)| (k.as_str(), v.as_str()))).status();
            match status {
                Ok(s) if s.success() => {}
                Ok(s) => {
                    if !line.ignore_error {
                        return Err(Error::exec(format!("[{}] Error {}", node.target, s.code().unwrap_or(1)), s.code().unwrap_or(1)));
                    }
                }
                Err(e) => return Err(Error::io(loc.clone(), e)),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ignore_and_silent_prefixes() {
        let l = parse_recipe_line("-@echo hi");
        assert!(l.ignore_error);
        assert!(l.silent);
        assert_eq!(l.text, "echo hi");
    }
}
