//! Control-flow builtins: `if`, `or`, `and`, `foreach`, `call`.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::Result;
use crate::eval::Evaluator;
use crate::util;

pub fn if_fn(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let cond = ev.eval_value(&args[0])?;
    if !cond.is_empty() {
        ev.eval_value(&args[1])
    } else if let Some(else_branch) = args.get(2) {
        ev.eval_value(else_branch)
    } else {
        Ok(String::new())
    }
}

pub fn or_fn(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    for a in args {
        let v = ev.eval_value(a)?;
        if !v.is_empty() {
            return Ok(v);
        }
    }
    Ok(String::new())
}

pub fn and_fn(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let mut last = String::new();
    for a in args {
        last = ev.eval_value(a)?;
        if last.is_empty() {
            return Ok(String::new());
        }
    }
    Ok(last)
}

pub fn foreach(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let var_name = ev.eval_value(&args[0])?;
    let list_text = ev.eval_value(&args[1])?;
    let words = util::split_words(&list_text);

    let mut out = Vec::with_capacity(words.len());
    for w in words {
        let mut scope = HashMap::new();
        scope.insert(var_name.clone(), w.to_string());
        ev.env.push_scope(scope);
        let result = ev.eval_value(&args[2]);
        ev.env.pop_scope();
        out.push(result?);
    }
    Ok(util::join_words(out))
}

pub fn call(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let func_name = ev.eval_value(&args[0])?;
    let mut scope = HashMap::new();
    for (i, a) in args[1..].iter().enumerate() {
        scope.insert((i + 1).to_string(), ev.eval_value(a)?);
    }
    scope.insert("0".to_string(), func_name.clone());
    let _ = loc;

    let value = ev.env.get(&func_name).map(|v| match &v.payload {
        crate::vars::Payload::Recursive(expr) => expr.clone(),
        crate::vars::Payload::Simple(s) => Value::literal(s.to_string()),
    });

    ev.env.push_scope(scope);
    let result = match value {
        Some(v) => ev.eval_value(&v),
        None => Ok(String::new()),
    };
    ev.env.pop_scope();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::Environment;

    #[test]
    fn if_picks_branch_by_condition() {
        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let args = vec![Value::literal("x"), Value::literal("yes"), Value::literal("no")];
        assert_eq!(if_fn(&mut ev, &Location::builtin(), &args).unwrap(), "yes");

        let args_empty = vec![Value::empty(), Value::literal("yes"), Value::literal("no")];
        assert_eq!(if_fn(&mut ev, &Location::builtin(), &args_empty).unwrap(), "no");
    }

    #[test]
    fn foreach_binds_loop_variable() {
        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let args = vec![
            Value::literal("x"),
            Value::literal("a b c"),
            Rc::new(Value::SymRef("x".to_string())),
        ];
        assert_eq!(foreach(&mut ev, &Location::builtin(), &args).unwrap(), "a b c");
    }
}
