// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for pipewright.

pub mod config;
pub mod list;
pub mod run;
pub mod which;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{Settings, CONFIG_ENV};
use crate::errors::PipewrightError;
use crate::utils::colors;

/// Token separating pipeline stages on the `run` command line
pub const STAGE_SEPARATOR: &str = "|";

/// Process pipeline runner
///
/// Discover executables and run chains of them joined by OS pipes.
#[derive(Parser, Debug)]
#[clap(
    name = "pipewright",
    version,
    about = "Discover executables and run them as OS-level pipelines",
    long_about = None,
    after_help = "Examples:\n\
        pipewright list                              List executables on the search path\n\
        pipewright which sort                        Show which executable a name resolves to\n\
        pipewright run -- seq 1 10 '|' sort -rn      Run a two-stage pipeline\n\
        pipewright config                            Print the effective settings\n\n\
        See 'pipewright <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Settings file (must exist when given)
    #[clap(long, global = true, value_name = "FILE", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load the settings this invocation asked for
    pub fn settings(&self) -> miette::Result<Settings> {
        Settings::load(self.config.as_deref()).map_err(report)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List executables found in directories
    List {
        /// Directories to scan (defaults to the search path)
        dirs: Vec<PathBuf>,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the executable a command name resolves to
    Which {
        /// Command name
        name: String,
    },

    /// Run a pipeline; separate stages with a literal '|' argument
    Run {
        /// Feed this file to the first stage
        #[clap(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Write the last stage's output to this file
        #[clap(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Append to the output file instead of truncating it
        #[clap(short, long, requires = "output")]
        append: bool,

        /// Exit with the rightmost failing stage's status
        #[clap(long)]
        pipefail: bool,

        /// Print the pipeline without running it
        #[clap(long)]
        dry_run: bool,

        /// Stages, e.g. `ls -l '|' wc -l`
        #[clap(required = true, last = true, value_name = "ARGV")]
        argv: Vec<String>,
    },

    /// Print the effective settings as TOML
    Config,
}

/// List output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Convert a library error for `main`, printing recovery steps first
pub fn report(err: PipewrightError) -> miette::Report {
    if let Some(suggestion) = err.recovery() {
        colors::print_recovery(&suggestion);
    }
    err.into()
}
