// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `configd`.
///
/// Either no positional arguments (use the configured or default roots) or
/// exactly two: the source root and the active root. Anything else is a usage
/// error and exits non-zero before the daemon starts.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "configd",
    version,
    about = "Compile YAML definitions through XSLT templates into a live configuration tree.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory holding definition/template pairs (default: /etc/configd).
    #[arg(value_name = "SOURCE", requires = "active")]
    pub source: Option<PathBuf>,

    /// Directory receiving generated files (default: /etc).
    #[arg(value_name = "ACTIVE")]
    pub active: Option<PathBuf>,

    /// Optional TOML config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CONFIGD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Compile every pair already present under the source root at startup.
    #[arg(long)]
    pub initial_sync: bool,
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
