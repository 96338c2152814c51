//! Path-manipulation builtins: `dir`, `notdir`, `suffix`, `basename`,
//! `addsuffix`, `addprefix`, `join`, `wildcard`, `realpath`, `abspath`.

use std::path::Path;
use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::Result;
use crate::eval::Evaluator;
use crate::util;

fn dir_of(word: &str) -> String {
    match word.rfind('/') {
        Some(i) => word[..=i].to_string(),
        None => "./".to_string(),
    }
}

fn notdir_of(word: &str) -> String {
    match word.rfind('/') {
        Some(i) => word[i + 1..].to_string(),
        None => word.to_string(),
    }
}

fn suffix_of(word: &str) -> Option<String> {
    let base = notdir_of(word);
    base.rfind('.').map(|i| base[i..].to_string())
}

fn basename_of(word: &str) -> String {
    let dir = dir_of(word);
    let base = notdir_of(word);
    match base.rfind('.') {
        Some(0) | None => word.to_string(),
        Some(i) => {
            if dir == "./" && !word.contains('/') {
                base[..i].to_string()
            } else {
                format!("{}{}", dir, &base[..i])
            }
        }
    }
}

pub fn dir(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::join_words(util::split_words(&text).into_iter().map(dir_of)))
}

pub fn notdir(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::join_words(util::split_words(&text).into_iter().map(notdir_of)))
}

pub fn suffix(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    let suffixes: Vec<String> = util::split_words(&text).into_iter().filter_map(suffix_of).collect();
    Ok(util::join_words(suffixes))
}

pub fn basename(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    Ok(util::join_words(util::split_words(&text).into_iter().map(basename_of)))
}

pub fn addsuffix(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let suffix = ev.eval_value(&args[0])?;
    let text = ev.eval_value(&args[1])?;
    Ok(util::join_words(util::split_words(&text).into_iter().map(|w| format!("{}{}", w, suffix))))
}

pub fn addprefix(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let prefix = ev.eval_value(&args[0])?;
    let text = ev.eval_value(&args[1])?;
    Ok(util::join_words(util::split_words(&text).into_iter().map(|w| format!("{}{}", prefix, w))))
}

pub fn join(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let a_text = ev.eval_value(&args[0])?;
    let b_text = ev.eval_value(&args[1])?;
    let a = util::split_words(&a_text);
    let b = util::split_words(&b_text);
    let len = a.len().max(b.len());
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let left = a.get(i).copied().unwrap_or("");
        let right = b.get(i).copied().unwrap_or("");
        out.push(format!("{}{}", left, right));
    }
    Ok(util::join_words(out))
}

pub fn wildcard(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    let mut matches = Vec::new();
    for pat in util::split_words(&text) {
        match glob::glob(pat) {
            Ok(paths) => {
                for p in paths.flatten() {
                    matches.push(p.to_string_lossy().into_owned());
                }
            }
            Err(_) => {}
        }
    }
    matches.sort_unstable();
    Ok(util::join_words(matches))
}

pub fn realpath(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    let resolved: Vec<String> = util::split_words(&text)
        .into_iter()
        .filter_map(|w| std::fs::canonicalize(w).ok())
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    Ok(util::join_words(resolved))
}

pub fn abspath(ev: &mut Evaluator, _loc: &Location, args: &[Rc<Value>]) -> Result<String> {
    let text = ev.eval_value(&args[0])?;
    let cwd = std::env::current_dir().unwrap_or_default();
    let resolved: Vec<String> = util::split_words(&text)
        .into_iter()
        .map(|w| normalize_abs(&cwd, w))
        .collect();
    Ok(util::join_words(resolved))
}

fn normalize_abs(cwd: &Path, word: &str) -> String {
    let joined = if Path::new(word).is_absolute() { Path::new(word).to_path_buf() } else { cwd.join(word) };
    let mut out: Vec<std::ffi::OsString> = Vec::new();
    for comp in joined.components() {
        use std::path::Component::*;
        match comp {
            CurDir => {}
            ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str().to_owned()),
        }
    }
    let mut result = std::path::PathBuf::new();
    for c in out {
        result.push(c);
    }
    result.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_and_notdir_split_on_last_slash() {
        assert_eq!(dir_of("src/foo.c"), "src/");
        assert_eq!(notdir_of("src/foo.c"), "foo.c");
        assert_eq!(dir_of("foo.c"), "./");
    }

    #[test]
    fn suffix_and_basename() {
        assert_eq!(suffix_of("src/foo.c"), Some(".c".to_string()));
        assert_eq!(basename_of("src/foo.c"), "src/foo");
        assert_eq!(basename_of("foo"), "foo");
    }
}
