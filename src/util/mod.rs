//! String and pattern utilities shared by the parser, evaluator and
//! function registry: whitespace splitting, `%`-pattern matching, paren/
//! quote-aware delimiter search, and comment stripping.
//!
//! Grounded on the lexing helpers in the teacher's `src/parser/lexer.rs`
//! (char-by-char scanning with an explicit position counter) and the
//! word-matching helpers in `src/interpreter/helpers/word_matching.rs`
//! (prefix/suffix splitting around a wildcard).

/// The ASCII whitespace set used for word splitting everywhere in Make,
/// including function arguments the registry declares `trim_space` for.
pub const WHITESPACE: [char; 6] = [' ', '\t', '\n', '\x0B', '\x0C', '\r'];

fn is_ws(c: char) -> bool {
    WHITESPACE.contains(&c)
}

/// Split on runs of ASCII whitespace, dropping empty words.
pub fn split_words(text: &str) -> Vec<&str> {
    text.split(is_ws).filter(|w| !w.is_empty()).collect()
}

/// Join words with a single space, the normal form `$(wordlist)`-style
/// functions return.
pub fn join_words<I, S>(words: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, w) in words.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(w.as_ref());
    }
    out
}

pub fn strip(text: &str) -> &str {
    text.trim_matches(|c| is_ws(c))
}

/// Find the first `%` in a pattern, returning `(prefix, suffix)` split
/// around it. A pattern with no `%` has no stem and never matches.
fn split_pattern(pattern: &str) -> Option<(&str, &str)> {
    pattern.find('%').map(|i| (&pattern[..i], &pattern[i + 1..]))
}

/// Match `text` against a `%`-pattern, returning the stem (the text that
/// `%` matched) on success.
pub fn pattern_match<'a>(pattern: &str, text: &'a str) -> Option<&'a str> {
    match split_pattern(pattern) {
        None => {
            if pattern == text {
                Some("")
            } else {
                None
            }
        }
        Some((prefix, suffix)) => {
            if text.len() < prefix.len() + suffix.len() {
                return None;
            }
            if !text.starts_with(prefix) || !text.ends_with(suffix) {
                return None;
            }
            Some(&text[prefix.len()..text.len() - suffix.len()])
        }
    }
}

/// Substitute the stem into a pattern that may itself contain `%`
/// (`appendSubst` in the spec's dep-builder terminology).
pub fn pattern_subst_stem(pattern: &str, stem: &str) -> String {
    match pattern.find('%') {
        Some(i) => format!("{}{}{}", &pattern[..i], stem, &pattern[i + 1..]),
        None => pattern.to_string(),
    }
}

/// `$(patsubst pattern,repl,word)` for a single word: match `word`
/// against `pattern`, then substitute the stem into `repl`. Returns the
/// original word unchanged if it doesn't match.
pub fn patsubst_one(pattern: &str, repl: &str, word: &str) -> String {
    match pattern_match(pattern, word) {
        Some(stem) => pattern_subst_stem(repl, stem),
        None => word.to_string(),
    }
}

/// Find the first occurrence of any byte in `terminators` that is not
/// nested inside balanced `(`/`)` or `{`/`}` and not escaped by a
/// preceding backslash. Used by the rule/assignment classifier and by
/// `ifeq`'s comma search.
pub fn find_outside_parens(text: &str, terminators: &[char]) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        match c {
            '(' | '{' => depth += 1,
            ')' | '}' => depth -= 1,
            _ => {
                if depth <= 0 && terminators.contains(&c) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Strip a `#`-comment that starts outside parens/quotes. Returns the
/// text with the comment (and any immediately preceding whitespace run
/// the comment is attached to) removed.
pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut depth = 0i32;
    let mut in_squote = false;
    let mut in_dquote = false;
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c == '\\' && i + 1 < bytes.len() {
            i += 2;
            continue;
        }
        match c {
            '\'' if !in_dquote => in_squote = !in_squote,
            '"' if !in_squote => in_dquote = !in_dquote,
            '(' | '{' if !in_squote && !in_dquote => depth += 1,
            ')' | '}' if !in_squote && !in_dquote => depth -= 1,
            '#' if !in_squote && !in_dquote && depth <= 0 => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_all_whitespace_chars() {
        assert_eq!(split_words("a\tb\nc\x0Bd\x0Ce\rf"), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn pattern_match_basic() {
        assert_eq!(pattern_match("%.c", "foo.c"), Some("foo"));
        assert_eq!(pattern_match("%.c", "foo.o"), None);
        assert_eq!(pattern_match("src/%.c", "src/foo.c"), Some("foo"));
    }

    #[test]
    fn pattern_match_no_percent_is_exact() {
        assert_eq!(pattern_match("foo.c", "foo.c"), Some(""));
        assert_eq!(pattern_match("foo.c", "bar.c"), None);
    }

    #[test]
    fn patsubst_one_roundtrip() {
        assert_eq!(patsubst_one("%.c", "%.o", "foo.c"), "foo.o");
        assert_eq!(patsubst_one("%.c", "%.o", "foo.h"), "foo.h");
    }

    #[test]
    fn find_outside_parens_skips_nested() {
        assert_eq!(find_outside_parens("$(foo,bar),baz", &[',']), Some("$(foo,bar)".len()));
    }

    #[test]
    fn strip_comment_respects_quotes_and_parens() {
        assert_eq!(strip_comment("X := a # comment"), "X := a ");
        assert_eq!(strip_comment("X := $(call f,#)"), "X := $(call f,#)");
    }
}
