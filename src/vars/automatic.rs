//! Automatic variables (`$@ $< $^ $+ $* $?` and their `D`/`F` suffix
//! forms), bound fresh for each recipe line as spec.md §4.4 describes.

use std::path::Path;

/// Snapshot of a single rule invocation's target/prerequisite data, used
/// to answer `$@`, `$<`, etc. while expanding a recipe line.
#[derive(Debug, Clone, Default)]
pub struct AutomaticVars {
    pub targets: Vec<String>,
    pub first_prereq: Option<String>,
    pub all_prereqs: Vec<String>,
    pub newer_prereqs: Vec<String>,
    pub stem: Option<String>,
}

impl AutomaticVars {
    /// Resolve a single automatic variable letter, or a `letter` + `D`/`F`
    /// directory/file-name suffix form (`$(@D)`, `$(<F)`, ...).
    pub fn resolve(&self, name: &str) -> Option<String> {
        let (letter, suffix) = split_suffix(name);
        let base = self.resolve_letter(letter)?;
        Some(match suffix {
            None => base,
            Some('D') => apply_words(&base, |w| dir_of(w)),
            Some('F') => apply_words(&base, |w| notdir_of(w)),
            Some(_) => return None,
        })
    }

    fn resolve_letter(&self, letter: char) -> Option<String> {
        match letter {
            '@' => Some(self.targets.join(" ")),
            '<' => Some(self.first_prereq.clone().unwrap_or_default()),
            '^' => Some(dedup_join(&self.all_prereqs)),
            '+' => Some(self.all_prereqs.join(" ")),
            '?' => Some(self.newer_prereqs.join(" ")),
            '*' => Some(self.stem.clone().unwrap_or_default()),
            _ => None,
        }
    }
}

fn split_suffix(name: &str) -> (char, Option<char>) {
    let mut chars = name.chars();
    let letter = chars.next().unwrap_or('\0');
    let suffix = chars.next().filter(|_| chars.as_str().is_empty());
    (letter, suffix)
}

fn apply_words(text: &str, f: impl Fn(&str) -> String) -> String {
    crate::util::join_words(crate::util::split_words(text).into_iter().map(|w| f(w)))
}

fn dir_of(word: &str) -> String {
    match Path::new(word).parent() {
        Some(p) if !p.as_os_str().is_empty() => format!("{}/", p.display()),
        _ => "./".to_string(),
    }
}

fn notdir_of(word: &str) -> String {
    Path::new(word)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| word.to_string())
}

fn dedup_join(words: &[String]) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for w in words {
        if seen.insert(w.as_str()) {
            out.push(w.as_str());
        }
    }
    crate::util::join_words(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_target_and_first_prereq() {
        let av = AutomaticVars {
            targets: vec!["out/a.o".into()],
            first_prereq: Some("a.c".into()),
            all_prereqs: vec!["a.c".into(), "a.h".into()],
            newer_prereqs: vec![],
            stem: Some("a".into()),
        };
        assert_eq!(av.resolve("@").unwrap(), "out/a.o");
        assert_eq!(av.resolve("<").unwrap(), "a.c");
        assert_eq!(av.resolve("^").unwrap(), "a.c a.h");
    }

    #[test]
    fn directory_and_file_suffix_forms() {
        let av = AutomaticVars {
            targets: vec!["out/a.o".into()],
            ..Default::default()
        };
        assert_eq!(av.resolve("@D").unwrap(), "out/");
        assert_eq!(av.resolve("@F").unwrap(), "a.o");
    }
}
