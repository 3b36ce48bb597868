//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "annocheck",
    version,
    about = "Annotation contract checker for LDLib source snapshots",
    long_about = "Annocheck validates LDLib annotation contracts (@UpdateListener, @ConfigList, @RPCPacket, ...) over source-tree snapshots and reports diagnostics with fixes.\n\nConfiguration precedence: CLI > annocheck.toml > defaults.",
    after_help = "Examples:\n  annocheck check\n  annocheck check 'build/snapshots/**/*.json' --output json\n  annocheck check --lang-root common --fix --write\n  annocheck markers --output json\n  annocheck rules",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, short, global = true, action = clap::ArgAction::SetTrue, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current annocheck version.")]
    Version,
    /// Validate snapshots
    #[command(
        about = "Run annotation checks",
        long_about = "Validate every snapshot matched by the given globs (or `snapshots` from annocheck.toml). Error diagnostics make the exit code 1.",
        after_help = "Examples:\n  annocheck check\n  annocheck check 'snapshots/*.json' --fix\n  annocheck check --fix --write"
    )]
    Check {
        #[arg(help = "Snapshot globs relative to the repository root")]
        snapshots: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long = "lang-root", help = "Directory searched for en_us.json language files (repeatable)")]
        lang_root: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Apply the first fix of every diagnostic (preview unless --write)")]
        fix: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, requires = "fix", help = "Write fixed snapshots and language files")]
        write: bool,
    },
    /// Show navigation markers
    #[command(
        about = "List navigation markers",
        long_about = "Show, per field and method, the annotated element or call sites it is linked to."
    )]
    Markers {
        #[arg(help = "Snapshot globs relative to the repository root")]
        snapshots: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
    /// List rules
    #[command(
        about = "List rules and dependencies",
        long_about = "Print the rule ids usable in disabled_rules and [severity], plus the active annotation dependencies."
    )]
    Rules {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
