//! CLI argument definitions for dtcheck.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dtcheck",
    version,
    about = "Regression tests for SQL transformation pipelines",
    long_about = "Seed source tables with fixture rows, run the transformation \
                  pipeline, then compare normalized target tables against the \
                  expectations declared in each specification."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for humans, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run specifications against the warehouse.
    Run(RunArgs),

    /// Print the canonical form of one warehouse table as JSON.
    Normalize(NormalizeArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Specification files (default: `specs` from the configuration).
    #[arg(value_name = "SPEC")]
    pub specs: Vec<PathBuf>,

    /// Configuration file (default: ./dtcheck.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Stop after the first specification that does not pass.
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Write each specification's extracted tables as JSON into this directory.
    #[arg(long = "dump-actuals", value_name = "DIR")]
    pub dump_actuals: Option<PathBuf>,

    /// Include fixture values in trace-level logs.
    #[arg(long = "log-data")]
    pub log_data: bool,
}

#[derive(Parser)]
pub struct NormalizeArgs {
    /// Table to extract from the configured schema.
    #[arg(long = "table", value_name = "NAME")]
    pub table: String,

    /// Configuration file (default: ./dtcheck.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
