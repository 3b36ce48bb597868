//! Annocheck CLI binary entry point.
//! Delegates to the library for check/markers/rules and prints results.

use annocheck::cli::{Cli, Commands};
use annocheck::config::{self, Effective};
use annocheck::models::FixDescriptor;
use annocheck::output::{self, error_prefix, info_prefix, note_prefix};
use annocheck::{engine, fix, usage};
use clap::Parser;

fn effective_or_exit(
    repo_root: Option<&str>,
    snapshots: &[String],
    out: Option<&str>,
    lang_roots: &[String],
) -> Effective {
    match config::resolve_effective(repo_root, snapshots, out, lang_roots) {
        Ok(eff) => {
            // Friendly note if no annocheck config was found
            if !eff.config_found && eff.output != "json" {
                eprintln!("{} No annocheck.toml found; using defaults.", note_prefix());
            }
            eff
        }
        Err(e) => {
            eprintln!("{} {}", error_prefix(), e);
            std::process::exit(2);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Check {
            snapshots,
            repo_root,
            output,
            lang_root,
            fix,
            write,
        } => {
            let eff = effective_or_exit(repo_root.as_deref(), &snapshots, output.as_deref(), &lang_root);
            let run = match engine::run_check(&eff.check_settings()) {
                Ok(run) => run,
                Err(e) => {
                    eprintln!("{} {}", error_prefix(), e);
                    std::process::exit(2);
                }
            };
            if run.files.is_empty() && eff.output != "json" {
                eprintln!(
                    "{} No snapshots matched [{}]",
                    info_prefix(),
                    eff.snapshots.join(", ")
                );
            }

            if fix {
                let mut results = Vec::new();
                for file in &run.files {
                    let fixable = file
                        .diagnostics
                        .iter()
                        .any(|d| d.fixes.first().is_some_and(|f| *f != FixDescriptor::NoFixAvailable));
                    if !fixable {
                        continue;
                    }
                    match fix::fix_snapshot(&file.path, &eff.repo_root, &file.diagnostics, write) {
                        Ok(r) => results.push(r),
                        Err(e) => {
                            eprintln!("{} {}", error_prefix(), e);
                            std::process::exit(2);
                        }
                    }
                }
                output::print_fixes(&results, &eff.output, write);
                return;
            }

            output::print_check(&run.result, &eff.output);
            if run.result.summary.errors > 0 {
                std::process::exit(1);
            }
        }
        Commands::Markers {
            snapshots,
            repo_root,
            output,
        } => {
            let eff = effective_or_exit(repo_root.as_deref(), &snapshots, output.as_deref(), &[]);
            let loaded = match engine::load_trees(&eff.repo_root, &eff.snapshots) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("{} {}", error_prefix(), e);
                    std::process::exit(2);
                }
            };
            for (_, failure) in &loaded.failures {
                eprintln!("{} {}", error_prefix(), failure.message);
            }
            let trees: Vec<_> = loaded.trees.into_iter().map(|(_, t)| t).collect();
            output::print_markers(&usage::markers(&trees), &eff.output);
        }
        Commands::Rules { repo_root, output } => {
            let eff = effective_or_exit(repo_root.as_deref(), &[], output.as_deref(), &[]);
            output::print_rules(&eff.registry(), &eff.output);
        }
    }
}
