//! Directive keyword table and `ifeq`/`ifneq` condition-form parsing.

use crate::ast::CondOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Include,
    IncludeOptional,
    Define,
    Endef,
    If(CondOp),
    Else,
    Endif,
    Override,
    Export,
    Unexport,
    VpathDirective,
}

/// Recognize the directive keyword at the start of a (comment-stripped,
/// trimmed) line, returning the directive and the remainder of the line.
pub fn recognize(line: &str) -> Option<(Directive, &str)> {
    const TABLE: &[(&str, Directive)] = &[
        ("include", Directive::Include),
        ("-include", Directive::IncludeOptional),
        ("sinclude", Directive::IncludeOptional),
        ("define", Directive::Define),
        ("endef", Directive::Endef),
        ("ifeq", Directive::If(CondOp::IfEq)),
        ("ifneq", Directive::If(CondOp::IfNeq)),
        ("ifdef", Directive::If(CondOp::IfDef)),
        ("ifndef", Directive::If(CondOp::IfNdef)),
        ("else", Directive::Else),
        ("endif", Directive::Endif),
        ("override", Directive::Override),
        ("export", Directive::Export),
        ("unexport", Directive::Unexport),
        ("vpath", Directive::VpathDirective),
    ];

    for (kw, dir) in TABLE {
        if let Some(rest) = line.strip_prefix(kw) {
            if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace()) {
                return Some((*dir, rest.trim_start()));
            }
        }
    }
    None
}

/// The two forms `ifeq`/`ifneq` accept: `(a,b)` and `"a" "b"` (or with
/// single quotes, possibly mixed).
pub enum CondArgs {
    Paren { lhs: String, rhs: String },
    Quoted { lhs: String, rhs: String },
}

pub fn parse_cond_args(rest: &str) -> Result<CondArgs, String> {
    let rest = crate::util::strip(rest);
    if let Some(inner) = rest.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        let idx = crate::util::find_outside_parens(inner, &[','])
            .ok_or_else(|| "missing ',' in ifeq/ifneq".to_string())?;
        let lhs = inner[..idx].to_string();
        let rhs = inner[idx + 1..].to_string();
        return Ok(CondArgs::Paren { lhs, rhs });
    }

    let mut chars = rest.trim_end();
    let (lhs, quote) = take_quoted(chars).ok_or_else(|| "invalid ifeq/ifneq form".to_string())?;
    chars = &chars[lhs.len() + 2..];
    chars = chars.trim_start();
    let (rhs, _) = take_quoted(chars).ok_or_else(|| "invalid ifeq/ifneq form".to_string())?;
    let _ = quote;
    Ok(CondArgs::Quoted { lhs: lhs.to_string(), rhs: rhs.to_string() })
}

/// Pull a `"..."` or `'...'` quoted chunk off the front of `text`,
/// returning its inner content (without the quotes).
fn take_quoted(text: &str) -> Option<(&str, char)> {
    let mut chars = text.chars();
    let quote = chars.next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = chars.as_str();
    let end = rest.find(quote)?;
    Some((&rest[..end], quote))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_keyword_with_trailing_args() {
        let (d, rest) = recognize("ifeq (a,b)").unwrap();
        assert_eq!(d, Directive::If(CondOp::IfEq));
        assert_eq!(rest, "(a,b)");
    }

    #[test]
    fn does_not_match_prefix_of_identifier() {
        assert!(recognize("ifeqfoo").is_none());
        assert!(recognize("definitely_a_target: x").is_none());
    }

    #[test]
    fn parses_paren_form() {
        match parse_cond_args("(a,b)").unwrap() {
            CondArgs::Paren { lhs, rhs } => {
                assert_eq!(lhs, "a");
                assert_eq!(rhs, "b");
            }
            _ => panic!("expected paren form"),
        }
    }

    #[test]
    fn parses_quoted_form() {
        match parse_cond_args("\"a\" \"b\"").unwrap() {
            CondArgs::Quoted { lhs, rhs } => {
                assert_eq!(lhs, "a");
                assert_eq!(rhs, "b");
            }
            _ => panic!("expected quoted form"),
        }
    }
}
