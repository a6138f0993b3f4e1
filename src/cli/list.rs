// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! List command - show discovered executables

use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Settings;
use crate::discovery::{list_executables, Executable};

/// List executables under `dirs`, or on the search path when empty
pub fn run(
    dirs: Vec<PathBuf>,
    format: OutputFormat,
    settings: &Settings,
    verbose: bool,
) -> Result<()> {
    let dirs = if dirs.is_empty() {
        settings.search_path()
    } else {
        dirs
    };

    let found: Vec<Executable> = dirs.iter().flat_map(|dir| list_executables(dir)).collect();

    match format {
        OutputFormat::Text => print_text(&dirs, &found, verbose),
        OutputFormat::Json => println!("{}", to_json(&found)?),
    }

    Ok(())
}

fn print_text(dirs: &[PathBuf], found: &[Executable], verbose: bool) {
    if verbose {
        eprintln!(
            "{} {} executables in {} directories",
            "Found".bold(),
            found.len(),
            dirs.len()
        );
    }

    let width = found.iter().map(|exe| exe.name.len()).max().unwrap_or(0);
    for exe in found {
        println!(
            "{}  {}",
            format!("{:width$}", exe.name, width = width).green(),
            exe.path.display().to_string().dimmed()
        );
    }
}

/// Render the listing as JSON
pub fn to_json(found: &[Executable]) -> Result<String> {
    serde_json::to_string_pretty(found).into_diagnostic()
}
