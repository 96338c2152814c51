//! Merges the flat list of `RawRule`s the evaluator produced into one
//! [`Rule`] per concrete (non-pattern) output, applying Make's
//! single-colon/double-colon merge semantics.
//!
//! Single-colon rules targeting the same output accumulate
//! prerequisites across every occurrence but keep only the most
//! recently defined non-empty recipe (with a warning were we tracking
//! one); double-colon rules never merge; each occurrence stays its own
//! independent `Rule` for that output.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::rules::types::{RawRule, Rule, RuleKind};

pub struct MergedRules {
    /// Concrete-target rules, in first-seen order.
    pub rules: Vec<Rule>,
    pub pattern_rules: Vec<RawRule>,
}

pub fn merge(raw_rules: Vec<RawRule>) -> Result<MergedRules> {
    let mut by_output: HashMap<String, usize> = HashMap::new();
    let mut rules: Vec<Rule> = Vec::new();
    let mut pattern_rules = Vec::new();
    let mut kinds: HashMap<String, RuleKind> = HashMap::new();

    for raw in raw_rules {
        if raw.is_pattern_rule() {
            pattern_rules.push(raw);
            continue;
        }

        for output in &raw.outputs {
            if let Some(existing_kind) = kinds.get(output) {
                if *existing_kind != raw.kind {
                    return Err(Error::dep(
                        raw.loc.clone(),
                        format!("target file '{}' has both : and :: entries", output),
                    ));
                }
            } else {
                kinds.insert(output.clone(), raw.kind);
            }

            match raw.kind {
                RuleKind::Double => {
                    rules.push(Rule {
                        outputs: vec![output.clone()],
                        implicit_outputs: raw.implicit_outputs.clone(),
                        prereqs: raw.prereqs.clone(),
                        order_only_prereqs: raw.order_only_prereqs.clone(),
                        validations: raw.validations.clone(),
                        recipe: raw.recipe.clone(),
                        recipe_loc: if raw.recipe.is_empty() { None } else { Some(raw.loc.clone()) },
                        is_double_colon: true,
                    });
                }
                RuleKind::Single => match by_output.get(output) {
                    None => {
                        by_output.insert(output.clone(), rules.len());
                        rules.push(Rule {
                            outputs: vec![output.clone()],
                            implicit_outputs: raw.implicit_outputs.clone(),
                            prereqs: raw.prereqs.clone(),
                            order_only_prereqs: raw.order_only_prereqs.clone(),
                            validations: raw.validations.clone(),
                            recipe: raw.recipe.clone(),
                            recipe_loc: if raw.recipe.is_empty() { None } else { Some(raw.loc.clone()) },
                            is_double_colon: false,
                        });
                    }
                    Some(&idx) => {
                        let existing = &mut rules[idx];
                        for p in &raw.prereqs {
                            if !existing.prereqs.contains(p) {
                                existing.prereqs.push(p.clone());
                            }
                        }
                        for p in &raw.order_only_prereqs {
                            if !existing.order_only_prereqs.contains(p) {
                                existing.order_only_prereqs.push(p.clone());
                            }
                        }
                        existing.implicit_outputs.extend(raw.implicit_outputs.iter().cloned());
                        existing.validations.extend(raw.validations.iter().cloned());
                        if !raw.recipe.is_empty() {
                            existing.recipe = raw.recipe.clone();
                            existing.recipe_loc = Some(raw.loc.clone());
                        }
                    }
                },
            }
        }
    }

    Ok(MergedRules { rules, pattern_rules })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;

    fn raw(output: &str, prereqs: &[&str], kind: RuleKind, recipe: &[&str]) -> RawRule {
        RawRule {
            loc: Location::builtin(),
            outputs: vec![output.to_string()],
            implicit_outputs: Vec::new(),
            kind,
            prereqs: prereqs.iter().map(|s| s.to_string()).collect(),
            order_only_prereqs: Vec::new(),
            validations: Vec::new(),
            recipe: recipe.iter().map(|s| crate::ast::Value::literal(*s)).collect(),
            is_suffix_rule: false,
        }
    }

    #[test]
    fn single_colon_accumulates_prereqs() {
        let merged = merge(vec![
            raw("a.o", &["a.c"], RuleKind::Single, &["cc -c a.c"]),
            raw("a.o", &["a.h"], RuleKind::Single, &[]),
        ])
        .unwrap();
        assert_eq!(merged.rules.len(), 1);
        assert_eq!(merged.rules[0].prereqs, vec!["a.c", "a.h"]);
        assert_eq!(merged.rules[0].recipe.len(), 1);
    }

    #[test]
    fn double_colon_rules_stay_separate() {
        let merged = merge(vec![
            raw("all", &["a"], RuleKind::Double, &["echo a"]),
            raw("all", &["b"], RuleKind::Double, &["echo b"]),
        ])
        .unwrap();
        assert_eq!(merged.rules.len(), 2);
    }

    #[test]
    fn mixed_colon_kinds_is_an_error() {
        let result = merge(vec![
            raw("x", &[], RuleKind::Single, &[]),
            raw("x", &[], RuleKind::Double, &[]),
        ]);
        assert!(result.is_err());
    }
}
