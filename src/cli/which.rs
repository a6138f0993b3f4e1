// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Which command - resolve a command name

use colored::Colorize;
use miette::Result;

use super::report;
use crate::config::Settings;
use crate::discovery::CommandRegistry;

/// Print the executable `name` resolves to
pub fn run(name: &str, settings: &Settings, verbose: bool) -> Result<()> {
    let registry = CommandRegistry::from_settings(settings);
    let binding = registry.resolve(name).map_err(report)?;

    if verbose {
        let origin = if registry.get(name).is_some() {
            "search path"
        } else {
            "PATH fallback"
        };
        eprintln!("{} {} ({})", "Resolved".bold(), name.cyan(), origin.dimmed());
    }
    println!("{}", binding);
    Ok(())
}
