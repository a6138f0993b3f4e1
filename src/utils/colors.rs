// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Terminal color utilities
//!
//! Provides consistent color schemes across the CLI.

use colored::Colorize;
use std::io::IsTerminal;

use crate::errors::RecoverySuggestion;

/// Check if colors should be used
pub fn should_use_colors() -> bool {
    // Respect NO_COLOR environment variable
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Apply [`should_use_colors`] to all later output
pub fn configure() {
    if !should_use_colors() {
        colored::control::set_override(false);
    }
}

/// Print a styled section (stderr)
pub fn print_section(title: &str) {
    eprintln!();
    eprintln!("{}:", title.bold());
}

/// Print a bullet point (stderr)
pub fn print_bullet(content: &str) {
    eprintln!("  • {}", content);
}

/// Print recovery steps for a failed command (stderr)
pub fn print_recovery(suggestion: &RecoverySuggestion) {
    eprintln!("{} {}", "→".blue(), suggestion.action.bold());
    for step in &suggestion.steps {
        print_bullet(step);
    }
    for command in &suggestion.commands {
        if command.starts_with('#') {
            eprintln!("    {}", command.dimmed());
        } else {
            eprintln!("    {}", command.cyan());
        }
    }
}
