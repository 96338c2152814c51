//! Ties the parser, evaluator, rule merger, dependency builder and
//! executor together into one entry point, the way the teacher's
//! `Bash` struct (`src/bash.rs`) wires its own parser/interpreter/fs
//! trio behind a single options-struct constructor.

use std::collections::HashSet;
use std::path::Path;

use crate::error::Result;
use crate::eval::statements::{Diagnostic, StatementExecutor};
use crate::exec::{ExecOptions, Executor, ParallelExecutor};
use crate::rules::merge::{self, MergedRules};
use crate::rules::pattern_rules;
use crate::rules::types::{RawRule, RuleVarBinding};
use crate::vars::{Environment, Origin};

#[derive(Default)]
pub struct EngineOptions {
    /// `-f FILE`, defaults to `Makefile`/`makefile`.
    pub makefile: Option<String>,
    /// `VAR=value` pairs from the command line; these override
    /// assignments in the makefile itself (`Origin::CommandLine`).
    pub cli_vars: Vec<(String, String)>,
    pub exec: ExecOptions,
    /// `-j N`; `1` (the default) runs serially.
    pub jobs: usize,
}

pub struct Engine {
    pub env: Environment,
    pub merged: MergedRules,
    pub diagnostics: Vec<Diagnostic>,
    pub options: EngineOptions,
    pub rule_vars: Vec<RuleVarBinding>,
    /// Targets named by a `.KATI_RESTAT:` special target: rebuild their
    /// dependents only if the recipe actually changed their content,
    /// mirroring ninja's restat edges.
    pub restat: HashSet<String>,
    pub default_target: Option<String>,
}

impl Engine {
    pub fn load(options: EngineOptions) -> Result<Self> {
        let makefile = options.makefile.clone().unwrap_or_else(default_makefile_name);
        let text = std::fs::read_to_string(&makefile).map_err(|e| crate::error::Error::io(crate::ast::Location::builtin(), e))?;

        let mut env = Environment::new();
        seed_environment(&mut env);
        for (k, v) in &options.cli_vars {
            // Command-line variables take precedence over plain makefile
            // assignments; only an explicit `override` directive may
            // reassign them (see `eval::statements::exec_assign`'s
            // `is_readonly && !is_override` check).
            let mut var = crate::vars::Var::simple(v.clone(), Origin::CommandLine);
            var.is_readonly = true;
            env.set_with_origin(k, var);
        }

        let stmts = crate::parser::parse(&text, &makefile);
        let mut exec = StatementExecutor::new(&mut env);
        if let Some(dir) = Path::new(&makefile).parent() {
            exec.include_dirs.push(dir.to_path_buf());
        }
        exec.exec_all(&stmts)?;
        let output = exec.into_output();

        let restat = extract_special(&output.rules, ".KATI_RESTAT");
        let default_target = default_goal_from_raw(&output.rules);
        let raw_rules = desugar_all(output.rules);
        let merged = merge::merge(raw_rules)?;

        Ok(Self { env, merged, diagnostics: output.diagnostics, options, rule_vars: output.rule_vars, restat, default_target })
    }

    pub fn phony_targets(&self) -> HashSet<String> {
        extract_phony_from_merged(&self.merged)
    }

    /// Resolves `goals` (or the implicit default goal) into a dependency
    /// graph, threading target-scoped variable bindings and the
    /// `.KATI_RESTAT`/default-target special targets through to the
    /// builder. Shared between `build` and callers that just want the
    /// graph (e.g. `--gen_all_targets`).
    pub fn build_graph(&mut self, goals: &[String]) -> Result<crate::depgraph::Graph> {
        let goals = if goals.is_empty() { self.default_goal() } else { goals.to_vec() };
        let phony = self.phony_targets();
        let default_target = self.default_target.clone();
        crate::depgraph::Builder::new(&self.merged, phony, &mut self.env)
            .with_special_targets(&self.restat, default_target.as_deref(), &self.rule_vars)
            .build(&goals)
    }

    pub fn build(&mut self, goals: &[String]) -> Result<()> {
        let graph = self.build_graph(goals)?;

        if self.options.jobs > 1 {
            ParallelExecutor::new(&graph, &mut self.env, self.options.exec, self.options.jobs).run()
        } else {
            Executor::new(&graph, &mut self.env, self.options.exec).run()
        }
    }

    /// The first target defined in the makefile that doesn't start with
    /// `.`, matching GNU Make's implicit default-goal rule.
    fn default_goal(&self) -> Vec<String> {
        match &self.default_target {
            Some(t) => vec![t.clone()],
            None => Vec::new(),
        }
    }
}

fn default_makefile_name() -> String {
    for candidate in ["Makefile", "makefile", "GNUmakefile"] {
        if Path::new(candidate).exists() {
            return candidate.to_string();
        }
    }
    "Makefile".to_string()
}

fn seed_environment(env: &mut Environment) {
    for (k, v) in std::env::vars() {
        let mut var = crate::vars::Var::simple(v, Origin::Environment);
        var.is_export = true;
        env.set_with_origin(k, var);
    }
    env.set_simple("MAKE", "kati-rs");
    env.set_simple("SHELL", "/bin/sh");
}

/// Collects the prerequisite list of every rule naming `special_target`
/// as an output, the same way `.PHONY: a b c` accumulates a set of
/// names rather than building anything itself. Used for `.PHONY` and
/// `.KATI_RESTAT`; `.KATI_NINJA_POOL`/`.KATI_DEPFILE`/`.KATI_TAGS` are
/// instead written as target-scoped variables and flow through
/// `RuleVarBinding` without needing a dedicated extraction pass.
fn extract_special(rules: &[RawRule], special_target: &str) -> HashSet<String> {
    let mut set = HashSet::new();
    for r in rules {
        if r.outputs.iter().any(|o| o == special_target) {
            set.extend(r.prereqs.iter().cloned());
        }
    }
    set
}

fn extract_phony_from_merged(merged: &MergedRules) -> HashSet<String> {
    let mut phony = HashSet::new();
    for r in &merged.rules {
        if r.outputs.iter().any(|o| o == ".PHONY") {
            phony.extend(r.prereqs.iter().cloned());
        }
    }
    phony
}

/// The first target defined in the makefile that doesn't start with
/// `.`, matching GNU Make's implicit default-goal rule. Computed from
/// the raw (pre-merge, pre-desugar) rule list so pattern/suffix rules
/// never accidentally become the default goal.
fn default_goal_from_raw(rules: &[RawRule]) -> Option<String> {
    for r in rules {
        if let Some(first) = r.outputs.first() {
            if !first.starts_with('.') && !first.contains('%') {
                return Some(first.clone());
            }
        }
    }
    None
}

fn desugar_all(rules: Vec<RawRule>) -> Vec<RawRule> {
    rules
        .into_iter()
        .map(|r| pattern_rules::desugar_suffix_rule(&r).unwrap_or(r))
        .collect()
}
