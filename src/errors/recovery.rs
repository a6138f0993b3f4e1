// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use std::io;
use std::path::Path;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for a program the OS refused to start
    pub fn for_launch_error(program: &str, kind: io::ErrorKind) -> Option<Self> {
        match kind {
            io::ErrorKind::NotFound => Some(Self::missing_executable(program)),
            io::ErrorKind::PermissionDenied => Some(Self::not_executable(program)),
            _ => None,
        }
    }

    /// Suggest locating a program that vanished or was never installed
    pub fn missing_executable(program: &str) -> Self {
        Self {
            action: format!("Make sure '{}' exists", program),
            steps: vec![
                "The executable was not found when the pipeline started".into(),
                "It may have been removed after the command table was built".into(),
            ],
            commands: vec![
                "# Check where the command resolves:".into(),
                format!("pipewright which {}", base_name(program)),
            ],
        }
    }

    /// Suggest granting execute permission
    pub fn not_executable(program: &str) -> Self {
        Self {
            action: format!("Grant execute permission on '{}'", program),
            steps: vec![
                "The file exists but the current user may not execute it".into(),
            ],
            commands: vec![
                "# Mark the file executable:".into(),
                format!("chmod +x {}", program),
            ],
        }
    }

    /// Suggest rebuilding a pipeline whose input is closed
    pub fn rebuild_pipeline() -> Self {
        Self {
            action: "Bind input before the pipeline runs".into(),
            steps: vec![
                "Reading a result executes the pipeline and closes its input".into(),
                "Build a new pipeline to run the commands with different input".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest creating a config file
    pub fn create_config(path: &Path) -> Self {
        Self {
            action: "Create the configuration file".into(),
            steps: vec![format!("No file exists at {}", path.display())],
            commands: vec![
                "# Write the effective settings as a starting point:".into(),
                format!("pipewright config > {}", path.display()),
            ],
        }
    }
}

fn base_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program)
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_uses_base_name() {
        let suggestion = RecoverySuggestion::missing_executable("/usr/bin/jq");
        assert!(suggestion.commands.contains(&"pipewright which jq".to_string()));
    }

    #[test]
    fn test_other_launch_errors_have_no_suggestion() {
        assert!(RecoverySuggestion::for_launch_error("x", io::ErrorKind::Interrupted).is_none());
    }

    #[test]
    fn test_display_lists_steps_and_commands() {
        let rendered = RecoverySuggestion::not_executable("/tmp/tool").to_string();
        assert!(rendered.starts_with("→ Grant execute permission on '/tmp/tool'"));
        assert!(rendered.contains("  chmod +x /tmp/tool"));
    }
}
