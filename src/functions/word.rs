//! Word-list builtins: `sort`, `word`, `wordlist`, `words`,
//! `firstword`, `lastword`.

use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::util;

pub fn sort(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    let mut words: Vec<&str> = util::split_words(&text);
    words.sort_unstable();
    words.dedup();
    Ok(util::join_words(words))
}

pub fn word(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let n_text = ev.eval_value(&args[0])?;
    let n: usize = n_text.trim().parse().map_err(|_| Error::eval(loc.clone(), format!("non-numeric first argument to 'word' function: '{}'", n_text)))?;
    if n == 0 {
        return Err(Error::eval(loc.clone(), "first argument to 'word' function must be greater than 0"));
    }
    let text = ev.eval_value(&args[1])?;
    let words = util::split_words(&text);
    Ok(words.get(n - 1).map(|s| s.to_string()).unwrap_or_default())
}

pub fn wordlist(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let s_text = ev.eval_value(&args[0])?;
    let e_text = ev.eval_value(&args[1])?;
    let start: usize = s_text.trim().parse().map_err(|_| Error::eval(loc.clone(), format!("non-numeric first argument to 'wordlist' function: '{}'", s_text)))?;
    let end: usize = e_text.trim().parse().map_err(|_| Error::eval(loc.clone(), format!("non-numeric second argument to 'wordlist' function: '{}'", e_text)))?;
    if start == 0 || start > end {
        return Err(Error::eval(loc.clone(), format!("invalid first argument to 'wordlist' function: '{}'", s_text)));
    }
    let text = ev.eval_value(&args[2])?;
    let words = util::split_words(&text);
    if start > words.len() {
        return Ok(String::new());
    }
    let end = end.min(words.len());
    Ok(util::join_words(&words[start - 1..end]))
}

pub fn words(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::split_words(&text).len().to_string())
}

pub fn firstword(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::split_words(&text).first().map(|s| s.to_string()).unwrap_or_default())
}

pub fn lastword(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::split_words(&text).last().map(|s| s.to_string()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_expr;
    use crate::vars::Environment;

    fn call(name: &str, args: &[&str]) -> Result<String> {
        let args_vals: Vec<Rc<Value>> = args.iter().map(|a| parse_expr(a, &[], true)).collect();
        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let f = crate::functions::lookup(name).unwrap();
        (f.func)(&mut ev, &Location::builtin(), &args_vals)
    }

    #[test]
    fn sort_dedups_and_orders() {
        assert_eq!(call("sort", &["b a c a"]).unwrap(), "a b c");
    }

    #[test]
    fn word_picks_one_indexed_word() {
        assert_eq!(call("word", &["2", "a b c"]).unwrap(), "b");
        assert!(call("word", &["0", "a b c"]).is_err());
    }

    #[test]
    fn wordlist_slices_inclusive() {
        assert_eq!(call("wordlist", &["2", "3", "a b c d"]).unwrap(), "b c");
    }

    #[test]
    fn wordlist_start_after_end_is_an_error() {
        assert!(call("wordlist", &["1", "0", "a b c"]).is_err());
    }

    #[test]
    fn wordlist_start_past_word_count_is_empty() {
        assert_eq!(call("wordlist", &["5", "7", "a b c"]).unwrap(), "");
    }

    #[test]
    fn words_counts() {
        assert_eq!(call("words", &["a b c"]).unwrap(), "3");
    }
}
