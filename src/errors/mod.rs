// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Error types with recovery hints
//!
//! Composition mistakes surface immediately; execution problems that the
//! caller cannot inspect through the exit status (an executable that
//! cannot be started) surface when the pipeline runs. A non-zero exit is
//! never an error.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipewright operations
pub type PipewrightResult<T> = Result<T, PipewrightError>;

/// Main error type for pipewright
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum PipewrightError {
    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to launch '{program}': {error}")]
    #[diagnostic(code(pipewright::launch_failed))]
    Launch {
        program: String,
        error: String,
        kind: io::ErrorKind,
        #[help]
        help: Option<String>,
    },

    #[error("Stage '{command}' has already been launched")]
    #[diagnostic(
        code(pipewright::already_launched),
        help("Build a fresh pipeline to run the same commands again")
    )]
    AlreadyLaunched { command: String },

    #[error("The input stream of '{pipeline}' is closed")]
    #[diagnostic(
        code(pipewright::closed_stream),
        help("Input can only be bound or inspected before the pipeline executes")
    )]
    ClosedStream { pipeline: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Composition Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Cannot {operation}: {reason}")]
    #[diagnostic(code(pipewright::composition_type))]
    CompositionType { operation: String, reason: String },

    #[error("Command has an empty argument vector")]
    #[diagnostic(
        code(pipewright::empty_command),
        help("A stage needs at least the program to run")
    )]
    EmptyCommand,

    #[error("Command '{name}' not found")]
    #[diagnostic(code(pipewright::command_not_found), help("{suggestion}"))]
    CommandNotFound { name: String, suggestion: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Config file not found: {path}")]
    #[diagnostic(
        code(pipewright::config_not_found),
        help("Check the --config argument or the PIPEWRIGHT_CONFIG variable")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to read config file '{path}': {error}")]
    #[diagnostic(code(pipewright::config_read_error))]
    ConfigRead { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(pipewright::io_error))]
    Io { message: String },

    #[error("TOML error: {message}")]
    #[diagnostic(code(pipewright::toml_error))]
    Toml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(pipewright::json_error))]
    Json { message: String },
}

impl From<io::Error> for PipewrightError {
    fn from(e: io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<toml::de::Error> for PipewrightError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<toml::ser::Error> for PipewrightError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for PipewrightError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl PipewrightError {
    /// Create a launch error, picking help text from the OS error kind
    pub fn launch(program: &str, error: &io::Error) -> Self {
        let help = RecoverySuggestion::for_launch_error(program, error.kind())
            .map(|suggestion| suggestion.action);

        Self::Launch {
            program: program.to_string(),
            error: error.to_string(),
            kind: error.kind(),
            help,
        }
    }

    /// Create a composition error for an operation
    pub fn composition(operation: &str, reason: impl Into<String>) -> Self {
        Self::CompositionType {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a command not found error with a lookup suggestion
    pub fn command_not_found(name: &str) -> Self {
        let suggestion = if name.contains('/') {
            format!("Check that '{}' exists and is executable", name)
        } else {
            format!("Install {} or add its directory to PATH", name)
        };

        Self::CommandNotFound {
            name: name.to_string(),
            suggestion,
        }
    }

    /// Recovery steps for this error, when there are any worth showing
    pub fn recovery(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::Launch { program, kind, .. } => {
                RecoverySuggestion::for_launch_error(program, *kind)
            }
            Self::CommandNotFound { name, .. } => Some(RecoverySuggestion::missing_executable(name)),
            Self::ClosedStream { .. } => Some(RecoverySuggestion::rebuild_pipeline()),
            Self::ConfigNotFound { path } => Some(RecoverySuggestion::create_config(path)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_help_for_missing_program() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        let error = PipewrightError::launch("/no/such/tool", &err);

        let PipewrightError::Launch { program, help, .. } = &error else {
            panic!("expected launch error");
        };
        assert_eq!(program, "/no/such/tool");
        assert!(help.as_deref().unwrap_or_default().contains("/no/such/tool"));
    }

    #[test]
    fn test_launch_error_recovery_for_permission_denied() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        let error = PipewrightError::launch("/tmp/script.sh", &err);

        let recovery = error.recovery().unwrap();
        assert!(recovery.commands.iter().any(|c| c.contains("chmod +x")));
    }

    #[test]
    fn test_command_not_found_suggestion() {
        let bare = PipewrightError::command_not_found("jq");
        assert!(bare.to_string().contains("'jq' not found"));

        let PipewrightError::CommandNotFound { suggestion, .. } =
            PipewrightError::command_not_found("./run.sh")
        else {
            panic!("expected command not found");
        };
        assert!(suggestion.contains("exists and is executable"));
    }

    #[test]
    fn test_io_error_conversion() {
        let error: PipewrightError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(error.to_string(), "IO error: boom");
    }
}
