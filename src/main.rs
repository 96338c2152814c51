use clap::Parser;

use kati::cli::{self, Cli};
use kati::engine::{Engine, EngineOptions};
use kati::exec::ExecOptions;

fn main() {
    let cli = Cli::parse();

    if let Some(dir) = &cli.directory {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("kati-rs: *** {}: {}.", dir, e);
            std::process::exit(1);
        }
    }

    if cli.ninja {
        eprintln!("kati-rs: warning: --ninja has no emission backend here, falling back to a parse-only run");
    }

    let (cli_vars, goals) = cli::split_args(&cli.args);

    let makefile = if cli.realpath {
        cli.file.as_ref().and_then(|f| std::fs::canonicalize(f).ok()).map(|p| p.to_string_lossy().into_owned()).or_else(|| cli.file.clone())
    } else {
        cli.file.clone()
    };

    if cli.enable_debug {
        eprintln!("kati-rs: debug: makefile={:?} goals={:?} jobs={}", makefile, goals, cli.jobs);
    }
    if cli.no_builtin_rules {
        eprintln!("kati-rs: debug: --no_builtin_rules has no effect, this engine seeds no implicit rules of its own");
    }

    let options = EngineOptions {
        makefile,
        cli_vars,
        exec: ExecOptions {
            dry_run: cli.dry_run,
            silent: cli.silent,
            keep_going: cli.keep_going,
            always_make: cli.always_make,
        },
        jobs: cli.jobs,
    };

    let mut engine = match Engine::load(options) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
    };

    for d in &engine.diagnostics {
        eprintln!("{}: {}", d.loc, d.message);
    }

    if cli.syntax_check_only || cli.parse_only || cli.ninja {
        std::process::exit(0);
    }

    if cli.gen_all_targets {
        let all: Vec<String> = engine.merged.rules.iter().flat_map(|r| r.outputs.iter().cloned()).collect();
        if let Err(e) = engine.build_graph(&all) {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
        std::process::exit(0);
    }

    if let Err(e) = engine.build(&goals) {
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}
