// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! pipewright - process pipeline runner
//!
//! Discover executables and run chains of them joined by OS pipes.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pipewright::cli::{run::RunOptions, Cli, Commands};
use pipewright::utils::colors;

/// Environment variable holding the log filter
const LOG_ENV: &str = "PIPEWRIGHT_LOG";

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "pipewright=debug"
    } else {
        "pipewright=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    colors::configure();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let settings = cli.settings()?;

    // Dispatch to command handlers
    match cli.command {
        Commands::List { dirs, format } => {
            pipewright::cli::list::run(dirs, format, &settings, cli.verbose)
        }
        Commands::Which { name } => {
            pipewright::cli::which::run(&name, &settings, cli.verbose)
        }
        Commands::Run {
            input,
            output,
            append,
            pipefail,
            dry_run,
            argv,
        } => {
            let options = RunOptions {
                input,
                output,
                append,
                pipefail,
                dry_run,
            };
            let status = pipewright::cli::run::run(argv, options, &settings, cli.verbose)?;
            std::process::exit(status);
        }
        Commands::Config => pipewright::cli::config::run(&settings, cli.verbose),
    }
}
