//! The builtin function table: name, arity and implementation pointer.
//!
//! Grounded on the teacher's reserved-word table in `src/parser/lexer.rs`
//! (a `lazy_static!` `HashMap` built once and looked up by name).

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{Location, Value};
use crate::error::Result;
use crate::eval::Evaluator;

use super::{kati, logic, meta, path, string, word};

pub type Builtin = fn(&mut Evaluator, &Location, &[Rc<Value>]) -> Result<String>;

#[derive(Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    /// Number of argument slots that receive single-separator (`,`)
    /// splitting. 0 means variadic: every remaining comma is swallowed
    /// into the last argument once the minimum count is satisfied (only
    /// `foreach`'s 3rd arg and `$(call ...)` behave this way).
    pub arity: usize,
    pub func: Builtin,
}

lazy_static::lazy_static! {
    static ref FUNCTIONS: HashMap<&'static str, FunctionSpec> = {
        let mut m = HashMap::new();
        let mut add = |spec: FunctionSpec| { m.insert(spec.name, spec); };

        add(FunctionSpec { name: "subst", arity: 3, func: string::subst });
        add(FunctionSpec { name: "patsubst", arity: 3, func: string::patsubst });
        add(FunctionSpec { name: "strip", arity: 1, func: string::strip_fn });
        add(FunctionSpec { name: "findstring", arity: 2, func: string::findstring });
        add(FunctionSpec { name: "filter", arity: 2, func: string::filter });
        add(FunctionSpec { name: "filter-out", arity: 2, func: string::filter_out });
        add(FunctionSpec { name: "sort", arity: 1, func: word::sort });
        add(FunctionSpec { name: "word", arity: 2, func: word::word });
        add(FunctionSpec { name: "wordlist", arity: 3, func: word::wordlist });
        add(FunctionSpec { name: "words", arity: 1, func: word::words });
        add(FunctionSpec { name: "firstword", arity: 1, func: word::firstword });
        add(FunctionSpec { name: "lastword", arity: 1, func: word::lastword });
        add(FunctionSpec { name: "dir", arity: 1, func: path::dir });
        add(FunctionSpec { name: "notdir", arity: 1, func: path::notdir });
        add(FunctionSpec { name: "suffix", arity: 1, func: path::suffix });
        add(FunctionSpec { name: "basename", arity: 1, func: path::basename });
        add(FunctionSpec { name: "addsuffix", arity: 2, func: path::addsuffix });
        add(FunctionSpec { name: "addprefix", arity: 2, func: path::addprefix });
        add(FunctionSpec { name: "join", arity: 2, func: path::join });
        add(FunctionSpec { name: "wildcard", arity: 1, func: path::wildcard });
        add(FunctionSpec { name: "realpath", arity: 1, func: path::realpath });
        add(FunctionSpec { name: "abspath", arity: 1, func: path::abspath });
        add(FunctionSpec { name: "if", arity: 3, func: logic::if_fn });
        add(FunctionSpec { name: "or", arity: 0, func: logic::or_fn });
        add(FunctionSpec { name: "and", arity: 0, func: logic::and_fn });
        add(FunctionSpec { name: "foreach", arity: 3, func: logic::foreach });
        add(FunctionSpec { name: "call", arity: 0, func: logic::call });
        add(FunctionSpec { name: "value", arity: 1, func: meta::value });
        add(FunctionSpec { name: "origin", arity: 1, func: meta::origin });
        add(FunctionSpec { name: "flavor", arity: 1, func: meta::flavor });
        add(FunctionSpec { name: "eval", arity: 1, func: meta::eval_fn });
        add(FunctionSpec { name: "shell", arity: 1, func: meta::shell });
        add(FunctionSpec { name: "error", arity: 1, func: meta::error_fn });
        add(FunctionSpec { name: "warning", arity: 1, func: meta::warning });
        add(FunctionSpec { name: "info", arity: 1, func: meta::info });
        add(FunctionSpec { name: "file", arity: 2, func: kati::file_fn });
        add(FunctionSpec { name: "KATI_deprecated_var", arity: 2, func: kati::deprecated_var });
        add(FunctionSpec { name: "KATI_obsolete_var", arity: 2, func: kati::obsolete_var });
        add(FunctionSpec { name: "KATI_deprecate_export", arity: 2, func: kati::deprecate_export });
        add(FunctionSpec { name: "KATI_obsolete_export", arity: 2, func: kati::obsolete_export });
        add(FunctionSpec { name: "KATI_profile_makefile", arity: 1, func: kati::profile_makefile });
        add(FunctionSpec { name: "KATI_variable_location", arity: 1, func: kati::variable_location });
        add(FunctionSpec { name: "KATI_extra_file_deps", arity: 1, func: kati::extra_file_deps });
        add(FunctionSpec { name: "KATI_shell_no_rerun", arity: 1, func: meta::shell });
        add(FunctionSpec { name: "KATI_foreach_sep", arity: 4, func: kati::foreach_sep });
        add(FunctionSpec { name: "KATI_file_no_rerun", arity: 2, func: kati::file_no_rerun });
        add(FunctionSpec { name: "KATI_visibility_prefix", arity: 2, func: kati::visibility_prefix });
        m
    };
}

pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    FUNCTIONS.get(name)
}
