// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Config command - print the effective settings

use miette::Result;

use super::report;
use crate::config::Settings;
use crate::utils::colors;

/// Print `settings` as TOML, with the resolved search path when verbose
pub fn run(settings: &Settings, verbose: bool) -> Result<()> {
    let text = settings.to_toml().map_err(report)?;
    print!("{}", text);

    if verbose {
        colors::print_section("Search path");
        for dir in settings.search_path() {
            colors::print_bullet(&dir.display().to_string());
        }
    }
    Ok(())
}
