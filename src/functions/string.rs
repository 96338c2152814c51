//! Text-substitution builtins: `subst`, `patsubst`, `strip`,
//! `findstring`, `filter`, `filter-out`.

use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::Result;
use crate::eval::Evaluator;
use crate::util;

pub fn subst(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let from = ev.eval_value(&args[0])?;
    let to = ev.eval_value(&args[1])?;
    let text = ev.eval_value(&args[2])?;
    if from.is_empty() {
        return Ok(text);
    }
    Ok(text.replace(&from, &to))
}

pub fn patsubst(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let pattern = ev.eval_value(&args[0])?;
    let repl = ev.eval_value(&args[1])?;
    let text = ev.eval_value(&args[2])?;
    let words = util::split_words(&text);
    Ok(util::join_words(words.into_iter().map(|w| util::patsubst_one(&pattern, &repl, w))))
}

pub fn strip_fn(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::join_words(util::split_words(&text)))
}

pub fn findstring(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let needle = ev.eval_value(&args[0])?;
    let haystack = ev.eval_value(&args[1])?;
    if haystack.contains(&needle) {
        Ok(needle)
    } else {
        Ok(String::new())
    }
}

pub fn filter(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let patterns_text = ev.eval_value(&args[0])?;
    let text = ev.eval_value(&args[1])?;
    let patterns: Vec<&str> = util::split_words(&patterns_text);
    let words = util::split_words(&text);
    let kept = words.into_iter().filter(|w| patterns.iter().any(|p| util::pattern_match(p, w).is_some()));
    Ok(util::join_words(kept))
}

pub fn filter_out(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let patterns_text = ev.eval_value(&args[0])?;
    let text = ev.eval_value(&args[1])?;
    let patterns: Vec<&str> = util::split_words(&patterns_text);
    let words = util::split_words(&text);
    let kept = words.into_iter().filter(|w| !patterns.iter().any(|p| util::pattern_match(p, w).is_some()));
    Ok(util::join_words(kept))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use crate::vars::Environment;

    fn call(name: &str, args: &[&str]) -> String {
        let args_vals: Vec<Rc<Value>> = args.iter().map(|a| parse_expr(a, &[], true)).collect();
        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let f = crate::functions::lookup(name).unwrap();
        (f.func)(&mut ev, &Location::builtin(), &args_vals).unwrap()
    }

    #[test]
    fn subst_replaces_all_occurrences() {
        assert_eq!(call("subst", &["ee", "EE", "feet on the street"]), "fEEt on the strEEt");
    }

    #[test]
    fn filter_keeps_matching_words() {
        assert_eq!(call("filter", &["%.c %.h", "a.c b.o c.h"]), "a.c c.h");
    }

    #[test]
    fn filter_out_drops_matching_words() {
        assert_eq!(call("filter-out", &["%.o", "a.c b.o c.o"]), "a.c");
    }

    #[test]
    fn strip_collapses_whitespace() {
        assert_eq!(call("strip", &["  a   b  "]), "a b");
    }
}
