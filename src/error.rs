//! Crate-wide error type.
//!
//! One variant per kind in spec.md §7, each carrying the originating
//! [`Location`]. Built with `thiserror`, following the precedent set by
//! the teacher's `FsError` in `src/fs/types.rs` (the only place in the
//! example pack that derives an error enum instead of hand-rolling
//! `Display`/`std::error::Error`, which is what this crate's other
//! control-flow-shaped failures do in `eval::flow`).

use thiserror::Error;

use crate::ast::Location;

#[derive(Debug, Error)]
pub enum Error {
    /// Syntax problems discovered while parsing; also raised when a
    /// preserved `StatementKind::ParseError` is evaluated.
    #[error("{loc}: *** {message}.")]
    Parse { loc: Location, message: String },

    /// Expansion-time failures: unknown function, wrong arity, `$(error)`,
    /// readonly/visibility violations, self-referential variables.
    #[error("{loc}: *** {message}.")]
    Eval { loc: Location, message: String },

    /// Rule/graph construction failures: mixed `:`/`::`, bad implicit
    /// outputs, pattern-rule conflicts.
    #[error("{loc}: *** {message}.")]
    Dep { loc: Location, message: String },

    /// Recipe command failed without an ignore-error prefix, or a
    /// non-phony target has no rule and no existing file.
    #[error("*** {message}")]
    Exec { message: String, exit_code: i32 },

    /// Include/file read or write failure.
    #[error("{loc}: {source}")]
    Io {
        loc: Location,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn parse(loc: Location, message: impl Into<String>) -> Self {
        Error::Parse { loc, message: message.into() }
    }

    pub fn eval(loc: Location, message: impl Into<String>) -> Self {
        Error::Eval { loc, message: message.into() }
    }

    pub fn dep(loc: Location, message: impl Into<String>) -> Self {
        Error::Dep { loc, message: message.into() }
    }

    pub fn exec(message: impl Into<String>, exit_code: i32) -> Self {
        Error::Exec { message: message.into(), exit_code }
    }

    pub fn io(loc: Location, source: std::io::Error) -> Self {
        Error::Io { loc, source }
    }

    /// The process exit code this error should produce at the CLI layer.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Exec { exit_code, .. } => *exit_code,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
