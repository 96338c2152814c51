//! A single variable's flavor, origin and payload.
//!
//! Grounded on the teacher's `ShellOptions`/`ShoptOptions` style of
//! plain struct-of-fields state (`src/interpreter/types.rs`), adapted
//! from boolean shell options to the richer per-variable metadata Make
//! needs: flavor, origin and read-only/export flags.

use std::rc::Rc;

use crate::ast::{Location, Value};

/// `$(flavor VAR)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Recursive,
    Simple,
    Undefined,
    /// `$@`, `$<`, etc. — never stored in `Environment`, only reported
    /// by `Evaluator::flavor_of` when the automatic-variable table
    /// resolves the name.
    Automatic,
}

/// `$(origin VAR)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Undefined,
    Default,
    Environment,
    EnvironmentOverride,
    File,
    CommandLine,
    Override,
    Automatic,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Undefined => "undefined",
            Origin::Default => "default",
            Origin::Environment => "environment",
            Origin::EnvironmentOverride => "environment override",
            Origin::File => "file",
            Origin::CommandLine => "command line",
            Origin::Override => "override",
            Origin::Automatic => "automatic",
        }
    }
}

/// A bound variable: either a deferred expression (recursive, expanded
/// every time it is referenced) or an already-flattened string (simple,
/// expanded once at the point of assignment).
#[derive(Debug, Clone)]
pub enum Payload {
    Recursive(Rc<Value>),
    Simple(Rc<str>),
}

#[derive(Debug, Clone)]
pub struct Var {
    pub payload: Payload,
    pub origin: Origin,
    pub is_readonly: bool,
    pub is_export: bool,
    /// Set by `$(KATI_deprecated_var ...)`/`$(KATI_deprecate_export ...)`:
    /// reading the variable emits a warning carrying this message.
    pub deprecated: Option<String>,
    /// Set by `$(KATI_obsolete_var ...)`/`$(KATI_obsolete_export ...)`:
    /// reading the variable is an eval error carrying this message.
    pub obsolete: Option<String>,
    /// Set by `$(KATI_visibility_prefix ...)`: only makefiles whose
    /// path starts with one of these prefixes may read the variable.
    pub visibility_prefixes: Option<Vec<String>>,
    /// Location of the assignment that last bound this variable, used
    /// by `$(KATI_variable_location ...)`.
    pub def_loc: Option<Location>,
}

impl Var {
    pub fn recursive(value: Rc<Value>, origin: Origin) -> Self {
        Self { payload: Payload::Recursive(value), origin, ..Self::default() }
    }

    pub fn simple(value: impl Into<Rc<str>>, origin: Origin) -> Self {
        Self { payload: Payload::Simple(value.into()), origin, ..Self::default() }
    }

    pub fn flavor(&self) -> Flavor {
        match self.payload {
            Payload::Recursive(_) => Flavor::Recursive,
            Payload::Simple(_) => Flavor::Simple,
        }
    }
}

impl Default for Var {
    /// An unset-but-annotatable placeholder: `$(KATI_deprecated_var ...)`
    /// and friends can be called on a name before it's ever assigned, in
    /// which case the name stays flavor-`Undefined` but still carries
    /// the annotation for the next read.
    fn default() -> Self {
        Self {
            payload: Payload::Simple(Rc::from("")),
            origin: Origin::Undefined,
            is_readonly: false,
            is_export: false,
            deprecated: None,
            obsolete: None,
            visibility_prefixes: None,
            def_loc: None,
        }
    }
}
