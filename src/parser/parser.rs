//! Line-oriented statement parser: joins continuations, recognizes
//! directives, classifies rule vs. assignment lines, and captures
//! `define`/`endef` bodies verbatim.
//!
//! Grounded on the teacher's `src/parser/lexer.rs` cursor-over-lines
//! style (track a line index, pull the next logical line, dispatch on
//! its shape) adapted from bash's token grammar to Make's much simpler
//! line grammar.

use std::rc::Rc;

use crate::ast::{AssignDirective, AssignOp, CondOp, Location, Statement, StatementKind, Value};
use crate::parser::directives::{self, CondArgs, Directive};
use crate::parser::expr::parse_expr;
use crate::util;

pub struct Parser<'a> {
    filename: Rc<str>,
    lines: Vec<&'a str>,
    idx: usize,
    lineno: u32,
}

const ASSIGN_TOKENS: &[(&str, AssignOp)] = &[
    ("::=", AssignOp::Simple),
    (":=", AssignOp::Simple),
    ("+=", AssignOp::Append),
    ("?=", AssignOp::Conditional),
    ("=", AssignOp::Recursive),
];

pub fn parse(text: &str, filename: &str) -> Vec<Statement> {
    let mut p = Parser::new(text, filename);
    p.parse_block(false)
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, filename: &str) -> Self {
        Self { filename: Rc::from(filename), lines: text.lines().collect(), idx: 0, lineno: 0 }
    }

    fn peek_raw_line(&self) -> Option<&'a str> {
        self.lines.get(self.idx).copied()
    }

    /// Pull the next logical line, joining `\`-continuations (collapsed
    /// to a single space, matching GNU Make outside of recipes).
    fn next_logical_line(&mut self) -> Option<String> {
        let first = self.peek_raw_line()?;
        self.idx += 1;
        self.lineno += 1;
        let mut out = first.to_string();
        while out.ends_with('\\') {
            out.pop();
            out.push(' ');
            match self.peek_raw_line() {
                Some(next) => {
                    self.idx += 1;
                    self.lineno += 1;
                    out.push_str(next.trim_start());
                }
                None => break,
            }
        }
        Some(out)
    }

    /// A single recipe line: only its own `\`-newline continuations are
    /// joined (literally, no space collapsing) since the whole line is
    /// handed to the shell verbatim.
    fn next_recipe_line(&mut self) -> Option<(String, u32)> {
        let lineno = self.lineno + 1;
        let first = self.peek_raw_line()?;
        self.idx += 1;
        self.lineno += 1;
        let mut out = first.to_string();
        while out.ends_with('\\') {
            match self.peek_raw_line() {
                Some(next) => {
                    self.idx += 1;
                    self.lineno += 1;
                    out.push('\n');
                    out.push_str(next);
                }
                None => break,
            }
        }
        Some((out, lineno))
    }

    /// Parse statements until EOF or, when `in_if` is set, until an
    /// `else`/`endif` belonging to the enclosing conditional is seen
    /// (left unconsumed so the caller can inspect it).
    fn parse_block(&mut self, in_if: bool) -> Vec<Statement> {
        let mut stmts = Vec::new();
        loop {
            let Some(raw) = self.peek_raw_line() else { break };

            if raw.is_empty() {
                self.idx += 1;
                self.lineno += 1;
                continue;
            }

            if raw.starts_with('\t') && matches!(stmts.last(), Some(Statement { kind: StatementKind::Rule { .. }, .. })) {
                self.absorb_recipe(&mut stmts);
                continue;
            }

            if in_if {
                if let Some((d, _)) = directives::recognize(raw.trim_start()) {
                    if matches!(d, Directive::Else | Directive::Endif) {
                        return stmts;
                    }
                }
            }

            let loc_lineno = self.lineno + 1;
            let raw = self.next_logical_line().unwrap();
            let loc = Location::new(self.filename.clone(), loc_lineno);

            if raw.trim().is_empty() {
                continue;
            }

            let trimmed_for_directive = raw.trim_start();
            if let Some((dir, rest)) = directives::recognize(trimmed_for_directive) {
                match dir {
                    Directive::Define => {
                        let name_expr = parse_expr(rest.trim(), &[], true);
                        let (body, body_lineno) = self.capture_define_body();
                        let body_loc = Location::new(self.filename.clone(), body_lineno);
                        let body_value = parse_expr(&body, &[], false);
                        stmts.push(Statement::new(
                            body_loc,
                            StatementKind::Assign {
                                lhs: name_expr,
                                rhs: body_value,
                                orig_rhs: body,
                                op: AssignOp::Recursive,
                                directive: AssignDirective::default(),
                                is_final: false,
                            },
                        ));
                    }
                    Directive::Endef => {
                        stmts.push(Statement::new(loc, StatementKind::ParseError { message: "extraneous 'endef'".into() }));
                    }
                    Directive::If(op) => {
                        stmts.push(self.parse_if(op, rest, &loc));
                    }
                    Directive::Else | Directive::Endif => {
                        stmts.push(Statement::new(
                            loc,
                            StatementKind::ParseError { message: format!("extraneous '{}'", trimmed_for_directive) },
                        ));
                    }
                    Directive::Include | Directive::IncludeOptional => {
                        let expr = parse_expr(rest, &[], true);
                        stmts.push(Statement::new(loc, StatementKind::Include { expr, must_exist: dir == Directive::Include }));
                    }
                    Directive::Override => {
                        stmts.push(self.parse_line_with_directive(rest, &loc, AssignDirective { is_override: true, is_export: false }));
                    }
                    Directive::Export => {
                        if rest.trim().is_empty() || looks_like_assignment(rest) {
                            stmts.push(self.parse_line_with_directive(rest, &loc, AssignDirective { is_override: false, is_export: true }));
                        } else {
                            let expr = parse_expr(rest, &[], true);
                            stmts.push(Statement::new(loc, StatementKind::Export { expr, is_export: true }));
                        }
                    }
                    Directive::Unexport => {
                        let expr = parse_expr(rest, &[], true);
                        stmts.push(Statement::new(loc, StatementKind::Export { expr, is_export: false }));
                    }
                    Directive::VpathDirective => {
                        let expr = parse_expr(&raw, &[], true);
                        stmts.push(Statement::new(loc, StatementKind::Command { expr }));
                    }
                }
                continue;
            }

            stmts.push(self.parse_line(&raw, &loc));
        }
        stmts
    }

    fn parse_line_with_directive(&mut self, rest: &str, loc: &Location, directive: AssignDirective) -> Statement {
        match self.parse_line(rest, loc).kind {
            StatementKind::Assign { lhs, rhs, orig_rhs, op, is_final, .. } => {
                Statement::new(loc.clone(), StatementKind::Assign { lhs, rhs, orig_rhs, op, directive, is_final })
            }
            other => Statement::new(loc.clone(), other),
        }
    }

    /// Parse one `ifeq`/`ifneq`/`ifdef`/`ifndef` and its whole
    /// `else`/`endif` chain, returning a single `If` statement.
    fn parse_if(&mut self, op: CondOp, rest: &str, loc: &Location) -> Statement {
        let (lhs_text, rhs_text) = parse_condition_operands(op, rest);
        let lhs = parse_expr(&lhs_text, &[], true);
        let rhs = rhs_text.map(|t| parse_expr(&t, &[], true));

        let true_stmts = self.parse_block(true);
        let mut false_stmts = Vec::new();

        if let Some(line) = self.peek_raw_line() {
            if let Some((Directive::Else, _)) = directives::recognize(line.trim_start()) {
                let raw = self.next_logical_line().unwrap();
                let else_rest = directives::recognize(raw.trim_start()).map(|(_, r)| r.trim().to_string()).unwrap_or_default();
                if !else_rest.is_empty() {
                    if let Some((Directive::If(op2), rest2)) = directives::recognize(&else_rest) {
                        false_stmts.push(self.parse_if(op2, rest2, loc));
                        return Statement::new(loc.clone(), StatementKind::If { op, lhs, rhs, true_stmts, false_stmts });
                    }
                } else {
                    false_stmts = self.parse_block(true);
                }
                self.consume_endif();
                return Statement::new(loc.clone(), StatementKind::If { op, lhs, rhs, true_stmts, false_stmts });
            }
        }
        self.consume_endif();
        Statement::new(loc.clone(), StatementKind::If { op, lhs, rhs, true_stmts, false_stmts })
    }

    fn consume_endif(&mut self) {
        if let Some(line) = self.peek_raw_line() {
            if let Some((Directive::Endif, _)) = directives::recognize(line.trim_start()) {
                self.idx += 1;
                self.lineno += 1;
            }
        }
    }

    /// Capture a `define`/`endef` body verbatim (no continuation joining,
    /// no comment stripping), tracking nested `define`s.
    fn capture_define_body(&mut self) -> (String, u32) {
        let start_lineno = self.lineno + 1;
        let mut body = String::new();
        let mut depth = 1u32;
        while let Some(line) = self.peek_raw_line() {
            self.idx += 1;
            self.lineno += 1;
            let trimmed = line.trim_start();
            if let Some((Directive::Define, _)) = directives::recognize(trimmed) {
                depth += 1;
            } else if let Some((Directive::Endef, _)) = directives::recognize(trimmed) {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            body.push_str(line);
            body.push('\n');
        }
        if body.ends_with('\n') {
            body.pop();
        }
        (body, start_lineno)
    }

    /// Append every following TAB-prefixed line to the recipe of the
    /// `Rule` statement just pushed, stopping at the first line that
    /// isn't TAB-prefixed.
    fn absorb_recipe(&mut self, stmts: &mut [Statement]) {
        while let Some(line) = self.peek_raw_line() {
            if !line.starts_with('\t') {
                break;
            }
            let (raw, _lineno) = self.next_recipe_line().unwrap();
            let body = &raw[1..];
            let expr = parse_expr(body, &[], false);
            if let Some(Statement { kind: StatementKind::Rule { recipe, .. }, .. }) = stmts.last_mut() {
                recipe.push(expr);
            }
        }
    }

    fn parse_line(&mut self, raw: &str, loc: &Location) -> Statement {
        let line = util::strip_comment(raw);
        let line = util::strip(line);
        if line.is_empty() {
            return Statement::new(loc.clone(), StatementKind::Command { expr: Value::empty() });
        }

        let assign = find_assign_op(line);
        let colon_pos = util::find_outside_parens(line, &[':']);

        // A colon occurring before any assignment token means this is a
        // rule line (possibly with a target-scoped `VAR = value` after
        // the colon, handled by `parse_rule_line` itself) — e.g.
        // `all: CC = gcc`. A colon at or after the assignment token is
        // just part of the RHS (`PATH = /usr/bin:/bin`) or the leading
        // character of `:=`/`::=` themselves, so the line is a plain
        // assignment instead.
        let is_rule_line = match (colon_pos, assign) {
            (Some(c), Some((_, _, a))) => c < a,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if is_rule_line {
            return self.parse_rule_line(line, colon_pos.unwrap(), loc);
        }

        if let Some((op, op_len, eq_pos)) = assign {
            let (lhs, directive) = split_directive_prefix(&line[..eq_pos]);
            let lhs_expr = parse_expr(lhs.trim_end(), &[], true);
            let rhs_text = line[eq_pos + op_len..].trim_start();
            let rhs_expr = parse_expr(rhs_text, &[], true);
            return Statement::new(
                loc.clone(),
                StatementKind::Assign {
                    lhs: lhs_expr,
                    rhs: rhs_expr,
                    orig_rhs: rhs_text.to_string(),
                    op,
                    directive,
                    is_final: false,
                },
            );
        }

        let expr = parse_expr(line, &[], true);
        Statement::new(loc.clone(), StatementKind::Command { expr })
    }

    fn parse_rule_line(&mut self, line: &str, colon_pos: usize, loc: &Location) -> Statement {
        let targets_text = &line[..colon_pos];
        let mut rest = &line[colon_pos + 1..];
        let is_double_colon = rest.starts_with(':');
        if is_double_colon {
            rest = &rest[1..];
        }

        let lhs_expr = parse_expr(targets_text.trim_end(), &[], true);
        let rest_trimmed = rest.trim_start();

        if let Some((op, op_len, eq_pos)) = find_assign_op(rest_trimmed) {
            let var_name = rest_trimmed[..eq_pos].trim_end();
            let var_lhs = parse_expr(var_name, &[], true);
            let rhs_text = rest_trimmed[eq_pos + op_len..].trim_start();
            let rhs_expr = parse_expr(rhs_text, &[], true);
            return Statement::new(
                loc.clone(),
                StatementKind::RuleVar {
                    targets: lhs_expr,
                    lhs: var_lhs,
                    rhs: rhs_expr,
                    orig_rhs: rhs_text.to_string(),
                    op,
                    is_double_colon,
                },
            );
        }

        let (prereqs_text, recipe) = if let Some(semi) = util::find_outside_parens(rest, &[';']) {
            let after = rest[semi + 1..].trim_start();
            (rest[..semi].trim(), vec![parse_expr(after, &[], false)])
        } else {
            (rest.trim(), Vec::new())
        };
        let prereqs = parse_expr(prereqs_text, &[], true);

        Statement::new(loc.clone(), StatementKind::Rule { lhs: lhs_expr, prereqs, recipe, is_double_colon })
    }
}

fn looks_like_assignment(text: &str) -> bool {
    find_assign_op(text).is_some()
}

fn find_assign_op(line: &str) -> Option<(AssignOp, usize, usize)> {
    let mut best: Option<(AssignOp, usize, usize)> = None;
    for (tok, op) in ASSIGN_TOKENS {
        if let Some(pos) = find_token_outside_parens(line, tok) {
            let better = match best {
                None => true,
                Some((_, best_len, best_pos)) => pos < best_pos || (pos == best_pos && tok.len() > best_len),
            };
            if better {
                best = Some((*op, tok.len(), pos));
            }
        }
    }
    best
}

fn find_token_outside_parens(text: &str, tok: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        match bytes[i] {
            b'(' | b'{' => depth += 1,
            b')' | b'}' => depth -= 1,
            _ => {
                if depth <= 0 && text[i..].starts_with(tok) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

fn split_directive_prefix(text: &str) -> (&str, AssignDirective) {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("export ") {
        return (rest, AssignDirective { is_override: false, is_export: true });
    }
    (trimmed, AssignDirective::default())
}

fn parse_condition_operands(op: CondOp, rest: &str) -> (String, Option<String>) {
    match op {
        CondOp::IfDef | CondOp::IfNdef => (rest.trim().to_string(), None),
        CondOp::IfEq | CondOp::IfNeq => match directives::parse_cond_args(rest) {
            Ok(CondArgs::Paren { lhs, rhs }) | Ok(CondArgs::Quoted { lhs, rhs }) => (lhs, Some(rhs)),
            Err(_) => (String::new(), Some(String::new())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use crate::vars::Environment;

    fn text(env: &mut Environment, v: &Rc<Value>) -> String {
        Evaluator::new(env).eval_value(v).unwrap()
    }

    #[test]
    fn rule_with_tab_recipe_absorbs_following_lines() {
        let stmts = parse("all: a b\n\t@echo one\n\t@echo two\n", "Makefile");
        assert_eq!(stmts.len(), 1);
        match &stmts[0].kind {
            StatementKind::Rule { lhs, prereqs, recipe, is_double_colon } => {
                let mut env = Environment::new();
                assert_eq!(text(&mut env, lhs), "all");
                assert_eq!(text(&mut env, prereqs), "a b");
                assert_eq!(recipe.len(), 2);
                assert_eq!(text(&mut env, &recipe[0]), "@echo one");
                assert_eq!(text(&mut env, &recipe[1]), "@echo two");
                assert!(!is_double_colon);
            }
            other => panic!("expected Rule, got {:?}", other),
        }
    }

    #[test]
    fn rule_with_inline_semicolon_recipe_keeps_prereqs() {
        let stmts = parse("out.o: out.c ; cc -c out.c\n", "Makefile");
        match &stmts[0].kind {
            StatementKind::Rule { prereqs, recipe, .. } => {
                let mut env = Environment::new();
                assert_eq!(text(&mut env, prereqs), "out.c");
                assert_eq!(recipe.len(), 1);
                assert_eq!(text(&mut env, &recipe[0]), "cc -c out.c");
            }
            other => panic!("expected Rule, got {:?}", other),
        }
    }

    #[test]
    fn double_colon_rule_is_flagged() {
        let stmts = parse("all:: dep\n\t@echo hi\n", "Makefile");
        match &stmts[0].kind {
            StatementKind::Rule { is_double_colon, .. } => assert!(is_double_colon),
            other => panic!("expected Rule, got {:?}", other),
        }
    }

    #[test]
    fn rule_var_line_is_not_a_recipe_absorption_trigger() {
        let stmts = parse("all: CC = gcc\n\t@echo hi\n", "Makefile");
        assert!(matches!(stmts[0].kind, StatementKind::RuleVar { .. }));
        assert!(matches!(stmts[1].kind, StatementKind::Command { .. }));
    }

    #[test]
    fn define_captures_body_verbatim_as_recursive_assignment() {
        let stmts = parse("define greet\n@echo hello $(1)\nendef\n", "Makefile");
        match &stmts[0].kind {
            StatementKind::Assign { op, orig_rhs, .. } => {
                assert_eq!(*op, AssignOp::Recursive);
                assert_eq!(orig_rhs, "@echo hello $(1)");
            }
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn if_else_nests_correctly() {
        let stmts = parse("ifeq (1,1)\nX := yes\nelse\nX := no\nendif\n", "Makefile");
        match &stmts[0].kind {
            StatementKind::If { true_stmts, false_stmts, .. } => {
                assert_eq!(true_stmts.len(), 1);
                assert_eq!(false_stmts.len(), 1);
            }
            other => panic!("expected If, got {:?}", other),
        }
    }

    #[test]
    fn assignment_operators_are_classified() {
        let stmts = parse("A := 1\nB = 2\nC += 3\nD ?= 4\n", "Makefile");
        let ops: Vec<AssignOp> = stmts
            .iter()
            .map(|s| match &s.kind {
                StatementKind::Assign { op, .. } => *op,
                _ => panic!("expected Assign"),
            })
            .collect();
        assert_eq!(ops, vec![AssignOp::Simple, AssignOp::Recursive, AssignOp::Append, AssignOp::Conditional]);
    }
}
