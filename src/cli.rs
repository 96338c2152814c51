//! Command-line surface, grounded on the teacher's flat `Cli` struct in
//! `src/main.rs` (one `#[derive(Parser)]` struct of `#[arg(...)]` fields,
//! no subcommands).

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "kati-rs")]
#[command(about = "A Make-compatible build specification engine")]
#[command(version)]
pub struct Cli {
    /// Read FILE as the makefile instead of searching for Makefile/makefile.
    #[arg(short = 'f', long = "file")]
    pub file: Option<String>,

    /// Change to DIR before reading the makefile or doing anything else.
    #[arg(short = 'C', long = "directory")]
    pub directory: Option<String>,

    /// Allow N recipes to run in parallel.
    #[arg(short = 'j', long = "jobs", default_value_t = 1)]
    pub jobs: usize,

    /// Print recipes without executing them.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Don't echo recipe lines before running them.
    #[arg(short = 's', long = "silent")]
    pub silent: bool,

    /// Keep building unrelated targets after one fails.
    #[arg(short = 'k', long = "keep-going")]
    pub keep_going: bool,

    /// Treat every target as out of date.
    #[arg(short = 'B', long = "always-make")]
    pub always_make: bool,

    /// Accepted for compatibility; this engine has no ninja emission
    /// backend, so this just forces a parse-only run with a warning.
    #[arg(long = "ninja")]
    pub ninja: bool,

    /// Accepted as a no-op for compatibility with the tool this engine's
    /// CLI surface is modeled on.
    #[arg(long = "regen")]
    pub regen: bool,

    /// Parse and build the dependency graph but don't run any recipes.
    #[arg(long = "gen_all_targets")]
    pub gen_all_targets: bool,

    /// Parse the makefile and report syntax errors without evaluating.
    #[arg(long = "syntax_check_only")]
    pub syntax_check_only: bool,

    /// Parse and evaluate but never build or run anything.
    #[arg(long = "parse_only")]
    pub parse_only: bool,

    /// Skip the engine's own implicit/pattern rule seeding.
    #[arg(long = "no_builtin_rules")]
    pub no_builtin_rules: bool,

    /// Emit extra diagnostics about rule resolution to stderr.
    #[arg(long = "enable_debug")]
    pub enable_debug: bool,

    /// Resolve include/makefile paths to their canonical absolute form.
    #[arg(long = "realpath")]
    pub realpath: bool,

    /// `VAR=value` command-line variable overrides and/or build goals;
    /// disambiguated by the presence of `=`.
    #[arg()]
    pub args: Vec<String>,
}

/// Splits `args` into `VAR=value` overrides and bare target goals, the
/// way GNU Make treats any positional containing `=` as a variable
/// assignment rather than a target name.
pub fn split_args(args: &[String]) -> (Vec<(String, String)>, Vec<String>) {
    let mut vars = Vec::new();
    let mut goals = Vec::new();
    for arg in args {
        match arg.find('=') {
            Some(pos) => vars.push((arg[..pos].to_string(), arg[pos + 1..].to_string())),
            None => goals.push(arg.clone()),
        }
    }
    (vars, goals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_assignments_from_targets() {
        let args = vec!["CC=gcc".to_string(), "all".to_string(), "OPT=-O2".to_string()];
        let (vars, goals) = split_args(&args);
        assert_eq!(vars, vec![("CC".to_string(), "gcc".to_string()), ("OPT".to_string(), "-O2".to_string())]);
        assert_eq!(goals, vec!["all".to_string()]);
    }
}
