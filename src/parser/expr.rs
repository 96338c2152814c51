//! The expression parser (`parseExpr` in spec.md §4.1): turns raw text
//! into a lazy [`Value`] tree.
//!
//! Key rules implemented here:
//! - `$$` is a literal `$`.
//! - `$c` (single char) is `SymRef("c")`.
//! - `$(...)`/`${...}` dispatch to a variable reference, a function call,
//!   or a `VAR:pat=subst` substitution depending on what follows the name
//!   expression.
//! - A bare `#` outside parens terminates the expression at the top level
//!   (not inside `define`/`endef` bodies or recipe lines).

use std::rc::Rc;

use crate::ast::Value;
use crate::functions::registry;
use crate::parser::scanner::Scanner;

/// Non-fatal parse diagnostics collected while building a `Value` tree.
/// The statement parser turns these into `StatementKind::ParseError`s.
#[derive(Debug, Clone)]
pub struct ExprDiagnostic {
    pub message: String,
}

pub struct ExprParser<'a> {
    sc: Scanner<'a>,
    pub diagnostics: Vec<ExprDiagnostic>,
}

impl<'a> ExprParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { sc: Scanner::new(text), diagnostics: Vec::new() }
    }

    pub fn pos(&self) -> usize {
        self.sc.pos()
    }

    fn err(&mut self, message: impl Into<String>) {
        self.diagnostics.push(ExprDiagnostic { message: message.into() });
    }

    /// Parse until one of `terminators` is reached outside any nested
    /// `$(...)`, or end of input. `strip_hash` controls whether a bare
    /// `#` ends the expression (true for normal statement text, false
    /// inside `$(...)`, recipe lines and `define` bodies).
    pub fn parse(&mut self, terminators: &[char], strip_hash: bool) -> Rc<Value> {
        let mut parts: Vec<Rc<Value>> = Vec::new();
        let mut literal = String::new();

        macro_rules! flush {
            () => {
                if !literal.is_empty() {
                    parts.push(Value::literal(std::mem::take(&mut literal)));
                }
            };
        }

        loop {
            let Some(c) = self.sc.peek() else { break };

            if terminators.contains(&c) {
                break;
            }
            if strip_hash && c == '#' {
                // Comment: consume to end of text, discard.
                while self.sc.bump().is_some() {}
                break;
            }
            if c == '\\' {
                if let Some(next) = self.sc.peek_at(1) {
                    if terminators.contains(&next) {
                        self.sc.advance(2);
                        literal.push(next);
                        continue;
                    }
                    self.sc.advance(2);
                    literal.push('\\');
                    literal.push(next);
                    continue;
                } else {
                    self.sc.bump();
                    literal.push('\\');
                    continue;
                }
            }
            if c == '$' {
                flush!();
                let v = self.parse_dollar();
                parts.push(v);
                continue;
            }
            self.sc.bump();
            literal.push(c);
        }

        flush!();
        Value::concat(parts)
    }

    fn parse_dollar(&mut self) -> Rc<Value> {
        self.sc.bump(); // consume '$'
        match self.sc.peek() {
            None => Value::literal("$"),
            Some('$') => {
                self.sc.bump();
                Value::literal("$")
            }
            Some('(') => {
                self.sc.bump();
                self.parse_group(')')
            }
            Some('{') => {
                self.sc.bump();
                self.parse_group('}')
            }
            Some(c) => {
                self.sc.bump();
                Rc::new(Value::SymRef(c.to_string()))
            }
        }
    }

    fn parse_group(&mut self, closer: char) -> Rc<Value> {
        let name = self.parse(&[closer, ':', ' ', '\t'], false);

        match self.sc.peek() {
            Some(c) if c == closer => {
                self.sc.bump();
                to_ref(name)
            }
            Some(':') => {
                self.sc.bump();
                let pattern = self.parse(&[closer, '='], false);
                if self.sc.peek() == Some('=') {
                    self.sc.bump();
                    let subst = self.parse(&[closer], false);
                    if self.sc.peek() == Some(closer) {
                        self.sc.bump();
                    } else {
                        self.err("unterminated variable reference");
                    }
                    Rc::new(Value::VarSubst { name, pattern, subst })
                } else {
                    // No '=' before the closer: degrade to a plain
                    // variable reference whose name includes the colon
                    // and pattern text.
                    if self.sc.peek() == Some(closer) {
                        self.sc.bump();
                    } else {
                        self.err("unterminated variable reference");
                    }
                    let merged = Value::concat(vec![name, Value::literal(":"), pattern]);
                    to_ref(merged)
                }
            }
            Some(ws) if ws == ' ' || ws == '\t' => {
                self.parse_maybe_function(name, closer)
            }
            None => {
                self.err("unterminated variable reference");
                to_ref(name)
            }
            Some(_) => unreachable!("terminator set only contains closer/':'/' '/'\\t'"),
        }
    }

    fn parse_maybe_function(&mut self, name: Rc<Value>, closer: char) -> Rc<Value> {
        let func_name = match &*name {
            Value::Literal(s) => Some(s.clone()),
            _ => None,
        };

        let spec = func_name.as_deref().and_then(registry::lookup);

        let Some(spec) = spec else {
            // Unknown function name (or a name requiring expansion):
            // back off and resume as a variable reference with an
            // embedded space.
            while matches!(self.sc.peek(), Some(' ') | Some('\t')) {
                self.sc.bump();
            }
            let rest = self.parse(&[closer], false);
            let merged = Value::concat(vec![name, Value::literal(" "), rest]);
            return if self.sc.peek() == Some(closer) {
                self.sc.bump();
                to_ref(merged)
            } else {
                self.err("unterminated variable reference");
                to_ref(merged)
            };
        };

        // Consume the separator whitespace run.
        while matches!(self.sc.peek(), Some(' ') | Some('\t')) {
            self.sc.bump();
        }

        let mut args: Vec<Rc<Value>> = Vec::new();
        let variadic = spec.arity == 0;
        loop {
            let remaining_fixed = spec.arity.saturating_sub(args.len());
            let is_last_arg = !variadic && remaining_fixed <= 1;
            let arg_terminators: &[char] = if is_last_arg { &[closer] } else { &[closer, ','] };
            let arg = self.parse(arg_terminators, false);
            args.push(arg);

            match self.sc.peek() {
                Some(',') if !is_last_arg => {
                    self.sc.bump();
                    continue;
                }
                Some(c) if c == closer => {
                    self.sc.bump();
                    break;
                }
                None => {
                    self.err(format!("unterminated call to {}", spec.name));
                    break;
                }
                _ => break,
            }
        }

        Rc::new(Value::Func { name: spec.name.to_string(), args })
    }
}

fn to_ref(name: Rc<Value>) -> Rc<Value> {
    if name.is_literal() {
        match &*name {
            Value::Literal(s) => Rc::new(Value::SymRef(s.clone())),
            _ => unreachable!(),
        }
    } else {
        Rc::new(Value::VarRef(name))
    }
}

/// Convenience entry point used outside the statement parser (e.g. by
/// `$(eval)` and `include`).
pub fn parse_expr(text: &str, terminators: &[char], strip_hash: bool) -> Rc<Value> {
    let mut p = ExprParser::new(text);
    p.parse(terminators, strip_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use crate::vars::Environment;

    fn eval_str(text: &str) -> String {
        let v = parse_expr(text, &[], true);
        let mut env = Environment::new();
        env.set_simple("A", "hello");
        let mut ev = Evaluator::new(&mut env);
        ev.eval_value(&v).unwrap()
    }

    #[test]
    fn dollar_dollar_is_literal_dollar() {
        assert_eq!(eval_str("$$"), "$");
    }

    #[test]
    fn single_char_var_ref() {
        let v = parse_expr("$A", &[], true);
        assert!(matches!(&*v, Value::SymRef(n) if n == "A"));
    }

    #[test]
    fn paren_var_ref() {
        assert_eq!(eval_str("$(A)"), "hello");
    }

    #[test]
    fn function_call_parses() {
        let v = parse_expr("$(strip  $(A) )", &[], true);
        assert!(matches!(&*v, Value::Func { name, .. } if name == "strip"));
    }

    #[test]
    fn unknown_function_name_backs_off_to_varref() {
        let v = parse_expr("$(not a function)", &[], true);
        assert!(matches!(&*v, Value::VarRef(_)));
    }

    #[test]
    fn var_subst_parses() {
        let v = parse_expr("$(A:%.c=%.o)", &[], true);
        assert!(matches!(&*v, Value::VarSubst { .. }));
    }

    #[test]
    fn colon_without_equals_degrades_to_varref() {
        let v = parse_expr("$(A:weird)", &[], true);
        assert!(matches!(&*v, Value::VarRef(_)));
    }
}
