//! Kati-extension builtins (`file`, `KATI_*`) beyond plain GNU Make.
//!
//! Most of these just poke at `Environment`'s per-variable metadata
//! (`deprecated`/`obsolete`/`visibility_prefixes`/`def_loc`, already
//! wired into `Evaluator::lookup_var`); a couple name functionality
//! this engine doesn't implement (regen stamp files, the ninja
//! profiler) and are one-shot-warning stubs instead.

use std::collections::HashMap;
use std::collections::HashSet;
use std::io::Write;
use std::rc::Rc;
use std::sync::Mutex;

use crate::ast::{Location, Value};
use crate::error::{Error, Result};
use crate::eval::Evaluator;

fn optional_message(ev: &mut Evaluator, args: &[Rc<Value>], index: usize) -> Result<String> {
    match args.get(index) {
        Some(expr) => ev.eval_value(expr),
        None => Ok(String::new()),
    }
}

pub fn deprecated_var(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    let msg = optional_message(ev, args, 1)?;
    ev.env.mark_deprecated(&name, msg);
    Ok(String::new())
}

pub fn obsolete_var(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    let msg = optional_message(ev, args, 1)?;
    ev.env.mark_obsolete(&name, msg);
    Ok(String::new())
}

/// Distinguishing "deprecated on export" from "deprecated on any read"
/// would need a second flag on `Var`; this crate tracks only a single
/// deprecation message per variable, so both forms share it.
pub fn deprecate_export(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    let msg = optional_message(ev, args, 1)?;
    ev.env.mark_deprecated(&name, msg);
    Ok(String::new())
}

pub fn obsolete_export(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    let msg = optional_message(ev, args, 1)?;
    ev.env.mark_obsolete(&name, msg);
    Ok(String::new())
}

pub fn visibility_prefix(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    let prefix = ev.eval_value(&args[1])?;
    ev.env.add_visibility_prefix(&name, prefix);
    Ok(String::new())
}

pub fn variable_location(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let name = ev.eval_value(&args[0])?;
    Ok(ev.env.get(&name).and_then(|v| v.def_loc.as_ref()).map(|l| l.to_string()).unwrap_or_default())
}

pub fn foreach_sep(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let var_name = ev.eval_value(&args[0])?;
    let sep = ev.eval_value(&args[1])?;
    let list_text = ev.eval_value(&args[2])?;
    let words = crate::util::split_words(&list_text);

    let mut out = Vec::with_capacity(words.len());
    for w in words {
        let mut scope = HashMap::new();
        scope.insert(var_name.clone(), w.to_string());
        ev.env.push_scope(scope);
        let result = ev.eval_value(&args[3]);
        ev.env.pop_scope();
        out.push(result?);
    }
    Ok(out.join(&sep))
}

/// `$(file spec[,text])`: `spec` starting with `<` reads a file (empty
/// string if it doesn't exist), `>` writes `text` truncating, `>>`
/// appends it.
pub fn file_fn(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let spec = ev.eval_value(&args[0])?;
    let text = match args.get(1) {
        Some(expr) => Some(ev.eval_value(expr)?),
        None => None,
    };
    run_file(loc, &spec, text)
}

/// Rerun-hashing isn't implemented, so the "no rerun" variant behaves
/// exactly like plain `file`.
pub fn file_no_rerun(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    file_fn(ev, loc, args)
}

fn run_file(loc: &Location, spec: &str, text: Option<String>) -> Result<String> {
    if let Some(path) = spec.strip_prefix(">>") {
        write_file(loc, path.trim(), text, true)
    } else if let Some(path) = spec.strip_prefix('>') {
        write_file(loc, path.trim(), text, false)
    } else if let Some(path) = spec.strip_prefix('<') {
        let path = path.trim();
        Ok(std::fs::read_to_string(path).unwrap_or_default().trim_end_matches('\n').to_string())
    } else {
        Err(Error::eval(loc.clone(), format!("invalid 'file' spec '{}': must start with '<', '>' or '>>'", spec)))
    }
}

fn write_file(loc: &Location, path: &str, text: Option<String>, append: bool) -> Result<String> {
    let mut contents = text.unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    if append {
        let mut f = std::fs::OpenOptions::new().create(true).append(true).open(path).map_err(|e| Error::io(loc.clone(), e))?;
        f.write_all(contents.as_bytes()).map_err(|e| Error::io(loc.clone(), e))?;
    } else {
        std::fs::write(path, contents).map_err(|e| Error::io(loc.clone(), e))?;
    }
    Ok(String::new())
}

lazy_static::lazy_static! {
    static ref WARNED_ONCE: Mutex<HashSet<&'static str>> = Mutex::new(HashSet::new());
}

fn warn_unimplemented_once(loc: &Location, name: &'static str) {
    let mut seen = WARNED_ONCE.lock().unwrap();
    if seen.insert(name) {
        eprintln!("{}: warning: {} has no effect in this engine", loc, name);
    }
}

/// Ninja-profiling output is out of scope (no ninja emission backend
/// exists here); warn once and otherwise ignore.
pub fn profile_makefile(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let _ = ev.eval_value(&args[0])?;
    warn_unimplemented_once(loc, "KATI_profile_makefile");
    Ok(String::new())
}

/// Regen-stamp extra file dependencies are out of scope (no regen/stamp
/// file tracking exists here); warn once and otherwise ignore.
pub fn extra_file_deps(ev: &mut Evaluator, loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let _ = ev.eval_value(&args[0])?;
    warn_unimplemented_once(loc, "KATI_extra_file_deps");
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::Environment;

    #[test]
    fn file_write_then_read_round_trips() {
        let dir = std::env::temp_dir().join(format!("kati_rs_file_fn_test_{}", std::process::id()));
        let path = dir.to_string_lossy().into_owned();

        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let write_args = vec![Value::literal(format!(">{}", path)), Value::literal("hello")];
        file_fn(&mut ev, &Location::builtin(), &write_args).unwrap();

        let read_args = vec![Value::literal(format!("<{}", path))];
        let result = file_fn(&mut ev, &Location::builtin(), &read_args).unwrap();
        assert_eq!(result, "hello");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn file_read_of_missing_path_is_empty() {
        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let args = vec![Value::literal("</nonexistent/kati-rs-test-path")];
        assert_eq!(file_fn(&mut ev, &Location::builtin(), &args).unwrap(), "");
    }

    #[test]
    fn deprecated_var_marks_name_and_warns_on_read() {
        let mut env = Environment::new();
        env.set_simple("X", "1");
        let mut ev = Evaluator::new(&mut env);
        let args = vec![Value::literal("X"), Value::literal("use Y instead")];
        deprecated_var(&mut ev, &Location::builtin(), &args).unwrap();
        assert_eq!(ev.lookup_var("X").unwrap(), "1");
    }

    #[test]
    fn obsolete_var_makes_reads_an_error() {
        let mut env = Environment::new();
        env.set_simple("X", "1");
        let mut ev = Evaluator::new(&mut env);
        let args = vec![Value::literal("X")];
        obsolete_var(&mut ev, &Location::builtin(), &args).unwrap();
        assert!(ev.lookup_var("X").is_err());
    }

    #[test]
    fn foreach_sep_joins_with_custom_separator() {
        let mut env = Environment::new();
        let mut ev = Evaluator::new(&mut env);
        let args = vec![Value::literal("x"), Value::literal(","), Value::literal("a b c"), Rc::new(Value::SymRef("x".to_string()))];
        assert_eq!(foreach_sep(&mut ev, &Location::builtin(), &args).unwrap(), "a,b,c");
    }
}
