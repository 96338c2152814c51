//! Pattern (`%`) and suffix (`.c.o:`) rule matching.
//!
//! Suffix rules are desugared into `%`-pattern rules at load time (the
//! classic Make trick: `.c.o:` becomes `%.o: %.c`), so the dependency
//! builder only ever has to consult one matcher.

use crate::rules::types::RawRule;
use crate::util;

/// A known suffix, built from `.SUFFIXES` — used only to desugar
/// `.x.y:` rules into pattern rules; it plays no other role once that
/// pass is done.
pub fn desugar_suffix_rule(raw: &RawRule) -> Option<RawRule> {
    if raw.outputs.len() != 1 {
        return None;
    }
    let name = &raw.outputs[0];
    if !name.starts_with('.') || raw.is_pattern_rule() {
        return None;
    }
    let rest = &name[1..];
    let dot = rest.find('.')?;
    let from = &rest[..dot];
    let to = &rest[dot + 1..];
    if from.is_empty() || to.is_empty() || to.contains('.') {
        return None;
    }

    let mut desugared = raw.clone();
    desugared.outputs = vec![format!("%.{}", to)];
    desugared.prereqs = vec![format!("%.{}", from)];
    desugared.is_suffix_rule = true;
    Some(desugared)
}

/// Find the pattern rule that builds `target`. Candidates are tried in
/// reverse definition order (most-recently-defined first); among those
/// whose output matches, the first one whose instantiated prerequisites
/// are all already on disk or themselves producible wins. If no
/// candidate's prerequisites check out this way, the most-recently-
/// defined matching candidate is still used as a fallback — the same
/// "try every candidate, best match wins" shape GNU Make itself falls
/// back to when no candidate is unambiguously buildable.
pub fn find_matching<'a>(target: &str, pattern_rules: &'a [RawRule], mut can_provide: impl FnMut(&str) -> bool) -> Option<(&'a RawRule, String)> {
    let mut fallback: Option<(&'a RawRule, String)> = None;
    for rule in pattern_rules.iter().rev() {
        for output in &rule.outputs {
            if let Some(stem) = util::pattern_match(output, target) {
                let stem = stem.to_string();
                let inputs = instantiate_prereqs(rule, &stem);
                if inputs.iter().all(|i| can_provide(i)) {
                    return Some((rule, stem));
                }
                if fallback.is_none() {
                    fallback = Some((rule, stem));
                }
            }
        }
    }
    fallback
}

/// Instantiate a pattern rule's prerequisites and recipe for a concrete
/// stem, producing prerequisite paths with `%` replaced throughout.
pub fn instantiate_prereqs(rule: &RawRule, stem: &str) -> Vec<String> {
    rule.prereqs.iter().map(|p| util::pattern_subst_stem(p, stem)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Location;
    use crate::rules::types::RuleKind;

    fn suffix_rule(name: &str) -> RawRule {
        RawRule {
            loc: Location::builtin(),
            outputs: vec![name.to_string()],
            implicit_outputs: Vec::new(),
            kind: RuleKind::Single,
            prereqs: Vec::new(),
            order_only_prereqs: Vec::new(),
            validations: Vec::new(),
            recipe: vec![crate::ast::Value::literal("cc -c $<")],
            is_suffix_rule: false,
        }
    }

    #[test]
    fn desugars_dot_c_dot_o() {
        let desugared = desugar_suffix_rule(&suffix_rule(".c.o")).unwrap();
        assert_eq!(desugared.outputs, vec!["%.o"]);
        assert_eq!(desugared.prereqs, vec!["%.c"]);
    }

    #[test]
    fn non_suffix_name_is_not_desugared() {
        assert!(desugar_suffix_rule(&suffix_rule("%.o")).is_none());
        assert!(desugar_suffix_rule(&suffix_rule("clean")).is_none());
    }

    #[test]
    fn find_matching_picks_matching_pattern() {
        let rules = vec![suffix_rule("%.o")];
        let (_rule, stem) = find_matching("foo.o", &rules, |_| true).unwrap();
        assert_eq!(stem, "foo");
    }

    #[test]
    fn find_matching_prefers_most_recent_buildable_candidate() {
        let mut older = suffix_rule("%.o");
        older.prereqs = vec!["%.cpp".to_string()];
        let mut newer = suffix_rule("%.o");
        newer.prereqs = vec!["%.c".to_string()];
        let rules = vec![older, newer];
        // Only foo.c exists; the newer (later-defined) rule wins because
        // its prerequisite is actually providable.
        let (rule, stem) = find_matching("foo.o", &rules, |input| input == "foo.c").unwrap();
        assert_eq!(stem, "foo");
        assert_eq!(rule.prereqs, vec!["%.c"]);
    }

    #[test]
    fn find_matching_falls_back_when_nothing_is_buildable() {
        let rules = vec![suffix_rule("%.o")];
        let (rule, stem) = find_matching("foo.o", &rules, |_| false).unwrap();
        assert_eq!(stem, "foo");
        assert!(rule.prereqs.is_empty());
    }
}
