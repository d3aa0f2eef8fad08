// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchrun",
    version,
    about = "Re-run pipelines of shell commands when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (YAML).
    ///
    /// Default: `watchrun.yaml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "watchrun.yaml")]
    pub config: String,

    /// Run the before/main/after trees once, no watching.
    #[arg(long)]
    pub once: bool,

    /// Force the legacy polling watcher, regardless of config.
    #[arg(long)]
    pub poll: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the activity, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
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
