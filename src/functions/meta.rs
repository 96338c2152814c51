//! Introspection and side-effecting builtins: `value`, `origin`,
//! `flavor`, `eval`, `shell`, `error`, `warning`, `info`.

use std::process::Command;
use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::{Error, Result};
use crate::eval::Evaluator;

pub fn value(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    Ok(ev.raw_value(&name).unwrap_or_default())
}

pub fn origin(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    Ok(ev.origin_of(&name).as_str().to_string())
}

pub fn flavor(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    Ok(match ev.flavor_of(&name) {
        crate::vars::Flavor::Recursive => "recursive",
        crate::vars::Flavor::Simple => "simple",
        crate::vars::Flavor::Undefined => "undefined",
        // Automatic variables are already-expanded text by the time
        // they're read, same as a simple variable.
        crate::vars::Flavor::Automatic => "simple",
    }
    .to_string())
}

pub fn eval_fn(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    let (new_rules, new_rule_vars) = crate::eval::statements::eval_into(ev.env, &text, loc)?;
    ev.pending_rules.extend(new_rules);
    ev.pending_rule_vars.extend(new_rule_vars);
    Ok(String::new())
}

pub fn shell(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let cmd = ev.eval_value(&args[0])?;
    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(&cmd)
        .output()
        .map_err(|e| Error::io(loc.clone(), e))?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    while text.ends_with('\n') {
        text.pop();
    }
    Ok(text.replace('\n', " "))
}

pub fn error_fn(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Err(Error::eval(loc.clone(), text))
}

pub fn warning(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    eprintln!("{}: {}", loc, text);
    Ok(String::new())
}

pub fn info(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    println!("{}", text);
    Ok(String::new())
}
