// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskpace`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskpace",
    version,
    about = "Run device tool commands through a priority-aware, paced task queue.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Taskpace.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKPACE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't run any commands.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the pre-execution delays from `[scheduler]`.
    #[arg(long)]
    pub no_delay: bool,

    /// Render the `[manifest]` section to stdout and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub print_manifest: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
