//! Builds the dependency graph from merged rules: resolves each goal's
//! prerequisites recursively (memoized), falling back to pattern/suffix
//! rules for targets with no exact rule, and detecting cycles.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::ast::{AssignOp, Location};
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::rules::merge::MergedRules;
use crate::rules::pattern_rules;
use crate::rules::types::{RawRule, RuleVarBinding};
use crate::vars::Environment;

use super::node::{DepNode, NodeState};

pub struct Graph {
    pub nodes: HashMap<String, DepNode>,
    /// Build order: prerequisites appear before the targets that need
    /// them (a valid topological order of the visited subgraph).
    pub order: Vec<String>,
}

pub struct Builder<'a> {
    concrete: HashMap<&'a str, &'a crate::rules::types::Rule>,
    pattern_rules: &'a [RawRule],
    phony: HashSet<String>,
    restat: Option<&'a HashSet<String>>,
    default_target: Option<&'a str>,
    rule_var_bindings: &'a [RuleVarBinding],
    env: &'a mut Environment,
    states: HashMap<String, NodeState>,
    nodes: HashMap<String, DepNode>,
    order: Vec<String>,
    stack: Vec<String>,
}

impl<'a> Builder<'a> {
    pub fn new(merged: &'a MergedRules, phony: HashSet<String>, env: &'a mut Environment) -> Self {
        let mut concrete = HashMap::new();
        for r in &merged.rules {
            for o in &r.outputs {
                concrete.insert(o.as_str(), r);
            }
        }
        Self {
            concrete,
            pattern_rules: &merged.pattern_rules,
            phony,
            restat: None,
            default_target: None,
            rule_var_bindings: &[],
            env,
            states: HashMap::new(),
            nodes: HashMap::new(),
            order: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn with_special_targets(mut self, restat: &'a HashSet<String>, default_target: Option<&'a str>, rule_var_bindings: &'a [RuleVarBinding]) -> Self {
        self.restat = Some(restat);
        self.default_target = default_target;
        self.rule_var_bindings = rule_var_bindings;
        self
    }

    pub fn build(mut self, goals: &[String]) -> Result<Graph> {
        for g in goals {
            self.visit(g)?;
        }
        Ok(Graph { nodes: self.nodes, order: self.order })
    }

    fn visit(&mut self, target: &str) -> Result<()> {
        match self.states.get(target) {
            Some(NodeState::Done) | Some(NodeState::Missing) => return Ok(()),
            Some(NodeState::Processing) => {
                return Err(Error::dep(Location::builtin(), format!("circular dependency dropped on '{}'", target)));
            }
            None => {}
        }
        self.states.insert(target.to_string(), NodeState::Processing);
        self.stack.push(target.to_string());

        let node = self.resolve(target)?;

        for p in node.prereqs.iter().chain(node.order_only_prereqs.iter()).cloned().collect::<Vec<_>>() {
            self.visit(&p)?;
        }

        self.stack.pop();
        self.states.insert(target.to_string(), NodeState::Done);
        self.nodes.insert(target.to_string(), node);
        self.order.push(target.to_string());
        Ok(())
    }

    /// Bindings from `target: VAR = value` statements whose target
    /// pattern matches `target`, split into the two special
    /// target-scoped names (`.KATI_VALIDATIONS`, `.KATI_IMPLICIT_OUTPUTS`)
    /// that feed dedicated `DepNode` fields and everything else, which
    /// is threaded through as a recipe-time scope.
    fn matching_rule_vars(&self, target: &str) -> Vec<&'a RuleVarBinding> {
        self.rule_var_bindings
            .iter()
            .filter(|b| {
                if b.target_pattern.contains('%') {
                    crate::util::pattern_match(&b.target_pattern, target).is_some()
                } else {
                    b.target_pattern == target
                }
            })
            .collect()
    }

    fn apply_rule_vars(&mut self, target: &str, implicit_outputs: &mut Vec<String>, validations: &mut Vec<String>) -> Result<Vec<(String, Rc<crate::ast::Value>, AssignOp)>> {
        let mut rule_vars = Vec::new();
        for binding in self.matching_rule_vars(target) {
            match binding.name.as_str() {
                ".KATI_VALIDATIONS" => {
                    let mut ev = Evaluator::with_loc(self.env, binding.loc.clone());
                    let text = ev.eval_value(&binding.rhs)?;
                    validations.extend(crate::util::split_words(&text).into_iter().map(|s| s.to_string()));
                }
                ".KATI_IMPLICIT_OUTPUTS" => {
                    let mut ev = Evaluator::with_loc(self.env, binding.loc.clone());
                    let text = ev.eval_value(&binding.rhs)?;
                    implicit_outputs.extend(crate::util::split_words(&text).into_iter().map(|s| s.to_string()));
                }
                _ => rule_vars.push((binding.name.clone(), binding.rhs.clone(), binding.op)),
            }
        }
        Ok(rule_vars)
    }

    fn resolve(&mut self, target: &str) -> Result<DepNode> {
        let is_default_target = self.default_target == Some(target);

        if let Some(rule) = self.concrete.get(target).copied() {
            let mut implicit_outputs = rule.implicit_outputs.clone();
            let mut validations = rule.validations.clone();
            let rule_vars = self.apply_rule_vars(target, &mut implicit_outputs, &mut validations)?;
            return Ok(DepNode {
                target: target.to_string(),
                prereqs: rule.prereqs.clone(),
                order_only_prereqs: rule.order_only_prereqs.clone(),
                validations,
                implicit_outputs,
                recipe: rule.recipe.clone(),
                recipe_loc: rule.recipe_loc.clone(),
                is_phony: self.phony.contains(target),
                is_double_colon: rule.is_double_colon,
                rule_vars,
                is_restat: self.restat.is_some_and(|r| r.contains(target)),
                is_default_target,
                stem: None,
            });
        }

        if let Some((rule, stem)) = pattern_rules::find_matching(target, self.pattern_rules, |input| self.can_provide(input)) {
            let prereqs = pattern_rules::instantiate_prereqs(rule, &stem);
            let mut implicit_outputs: Vec<String> = rule.implicit_outputs.iter().map(|o| crate::util::pattern_subst_stem(o, &stem)).collect();
            let mut validations = rule.validations.clone();
            let rule_vars = self.apply_rule_vars(target, &mut implicit_outputs, &mut validations)?;
            return Ok(DepNode {
                target: target.to_string(),
                prereqs,
                order_only_prereqs: rule.order_only_prereqs.iter().map(|p| crate::util::pattern_subst_stem(p, &stem)).collect(),
                validations,
                implicit_outputs,
                recipe: rule.recipe.clone(),
                recipe_loc: Some(rule.loc.clone()),
                is_phony: self.phony.contains(target),
                is_double_colon: false,
                rule_vars,
                is_restat: self.restat.is_some_and(|r| r.contains(target)),
                is_default_target,
                stem: Some(stem),
            });
        }

        if self.phony.contains(target) || std::path::Path::new(target).exists() {
            let mut implicit_outputs = Vec::new();
            let mut validations = Vec::new();
            let rule_vars = self.apply_rule_vars(target, &mut implicit_outputs, &mut validations)?;
            return Ok(DepNode {
                target: target.to_string(),
                prereqs: Vec::new(),
                order_only_prereqs: Vec::new(),
                validations,
                implicit_outputs,
                recipe: Vec::new(),
                recipe_loc: None,
                is_phony: self.phony.contains(target),
                is_double_colon: false,
                rule_vars,
                is_restat: self.restat.is_some_and(|r| r.contains(target)),
                is_default_target,
                stem: None,
            });
        }

        Err(Error::dep(Location::builtin(), format!("No rule to make target '{}'", target)))
    }

    /// Whether `input` can already be satisfied: it exists on disk, has
    /// its own concrete rule, or matches some other pattern rule's
    /// output. Used only to score pattern-rule candidates against each
    /// other, not as a full recursive buildability proof.
    fn can_provide(&self, input: &str) -> bool {
        self.concrete.contains_key(input) || std::path::Path::new(input).exists() || self.pattern_rules.iter().any(|r| r.outputs.iter().any(|o| crate::util::pattern_match(o, input).is_some()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::types::{Rule, RuleKind};

    fn rule(output: &str, prereqs: &[&str]) -> Rule {
        Rule {
            outputs: vec![output.to_string()],
            implicit_outputs: Vec::new(),
            prereqs: prereqs.iter().map(|s| s.to_string()).collect(),
            order_only_prereqs: Vec::new(),
            validations: Vec::new(),
            recipe: vec![crate::ast::Value::literal("echo hi")],
            recipe_loc: None,
            is_double_colon: false,
        }
    }

    #[test]
    fn builds_linear_chain_in_dependency_order() {
        let merged = MergedRules { rules: vec![rule("c", &["b"]), rule("b", &["a"])], pattern_rules: vec![] };
        let mut phony = HashSet::new();
        phony.insert("a".to_string());
        phony.insert("b".to_string());
        phony.insert("c".to_string());
        let mut env = Environment::new();
        let graph = Builder::new(&merged, phony, &mut env).build(&["c".to_string()]).unwrap();
        let pos_a = graph.order.iter().position(|t| t == "a").unwrap();
        let pos_b = graph.order.iter().position(|t| t == "b").unwrap();
        let pos_c = graph.order.iter().position(|t| t == "c").unwrap();
        assert!(pos_a < pos_b && pos_b < pos_c);
    }

    #[test]
    fn missing_rule_for_nonexistent_file_is_an_error() {
        let merged = MergedRules { rules: vec![], pattern_rules: vec![] };
        let mut env = Environment::new();
        let result = Builder::new(&merged, HashSet::new(), &mut env).build(&["nonexistent_xyz".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn detects_cycles() {
        let merged = MergedRules { rules: vec![rule("a", &["b"]), rule("b", &["a"])], pattern_rules: vec![] };
        let mut phony = HashSet::new();
        phony.insert("a".to_string());
        phony.insert("b".to_string());
        let mut env = Environment::new();
        let result = Builder::new(&merged, phony, &mut env).build(&["a".to_string()]);
        assert!(result.is_err());
    }
}
