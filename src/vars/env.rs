//! Variable environment: a global table plus a stack of scopes pushed
//! for `$(call ...)` and `$(foreach ...)`, matching the teacher's
//! `local_scopes: Vec<HashMap<..>>` stack in `src/interpreter/types.rs`
//! (one map per call, popped unconditionally on every exit path).

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Value;
use crate::vars::types::{Origin, Payload, Var};

/// Declaration-ordered so `$(.VARIABLES)`-style enumeration and test
/// output are deterministic instead of depending on hash iteration
/// order, the way the teacher uses `indexmap` for its own ordered
/// option tables.
pub struct Environment {
    globals: IndexMap<String, Var>,
    /// `$1`.."$9"-style call-scoped positional parameters for `$(call)`.
    scopes: Vec<HashMap<String, String>>,
}

impl Environment {
    pub fn new() -> Self {
        Self { globals: IndexMap::new(), scopes: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Var> {
        self.globals.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    /// Look up a call-scoped positional parameter (`$1`, `$(1)`, ...), the
    /// innermost scope winning. Falls back to `None` so the caller can
    /// resolve the name as a regular variable instead.
    pub fn lookup_positional(&self, name: &str) -> Option<&str> {
        for scope in self.scopes.iter().rev() {
            if let Some(v) = scope.get(name) {
                return Some(v);
            }
        }
        None
    }

    pub fn push_scope(&mut self, args: HashMap<String, String>) {
        self.scopes.push(args);
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn set(&mut self, name: impl Into<String>, var: Var) {
        self.globals.insert(name.into(), var);
    }

    /// `name := value`, already-flattened.
    pub fn set_simple(&mut self, name: impl Into<String>, value: impl Into<Rc<str>>) {
        self.set(name, Var::simple(value, Origin::File));
    }

    /// `name = value`, stored unevaluated.
    pub fn set_recursive(&mut self, name: impl Into<String>, value: Rc<Value>) {
        self.set(name, Var::recursive(value, Origin::File));
    }

    pub fn set_with_origin(&mut self, name: impl Into<String>, var: Var) {
        let name = name.into();
        if let Some(existing) = self.globals.get(&name) {
            if existing.is_readonly {
                return;
            }
        }
        self.globals.insert(name, var);
    }

    pub fn unset(&mut self, name: &str) {
        self.globals.remove(name);
    }

    /// Restores a variable to a previously captured snapshot, or removes
    /// it if it had none, bypassing the read-only guard. Used to unwind
    /// a target-scoped variable binding once a recipe finishes running.
    pub fn restore(&mut self, name: &str, var: Option<Var>) {
        match var {
            Some(v) => {
                self.globals.insert(name.to_string(), v);
            }
            None => {
                self.globals.remove(name);
            }
        }
    }

    pub fn mark_export(&mut self, name: &str, export: bool) {
        if let Some(v) = self.globals.get_mut(name) {
            v.is_export = export;
        }
    }

    fn entry_mut(&mut self, name: &str) -> &mut Var {
        if !self.globals.contains_key(name) {
            self.globals.insert(name.to_string(), Var::default());
        }
        self.globals.get_mut(name).unwrap()
    }

    /// `$(KATI_deprecated_var VAR[,msg])` / `$(KATI_deprecate_export VAR[,msg])`.
    pub fn mark_deprecated(&mut self, name: &str, message: String) {
        self.entry_mut(name).deprecated = Some(message);
    }

    /// `$(KATI_obsolete_var VAR[,msg])` / `$(KATI_obsolete_export VAR[,msg])`.
    pub fn mark_obsolete(&mut self, name: &str, message: String) {
        self.entry_mut(name).obsolete = Some(message);
    }

    /// `$(KATI_visibility_prefix VAR,prefix)` — prefixes accumulate
    /// across repeated calls for the same variable.
    pub fn add_visibility_prefix(&mut self, name: &str, prefix: String) {
        let var = self.entry_mut(name);
        var.visibility_prefixes.get_or_insert_with(Vec::new).push(prefix);
    }

    pub fn set_def_loc(&mut self, name: &str, loc: crate::ast::Location) {
        if let Some(v) = self.globals.get_mut(name) {
            v.def_loc = Some(loc);
        }
    }

    pub fn exported(&self) -> impl Iterator<Item = (&str, &Var)> {
        self.globals.iter().filter(|(_, v)| v.is_export).map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.globals.keys().map(|s| s.as_str())
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
