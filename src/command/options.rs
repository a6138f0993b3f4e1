// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Command-line option formatting
//!
//! One-character names get a single dash, longer names two:
//! `-v`, `--verbose`, `-n 5`, `--lines=5`.

/// Flags and key/value options for a command, kept in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    flags: Vec<String>,
    options: Vec<(String, String)>,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a boolean switch
    pub fn flag(mut self, name: impl Into<String>) -> Self {
        self.flags.push(name.into());
        self
    }

    /// Add an option taking a value
    pub fn option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.push((key.into(), value.to_string()));
        self
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.options.is_empty()
    }

    /// Render as arguments: every flag first, then every option
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self.flags.iter().map(|flag| format_flag(flag)).collect();
        for (key, value) in &self.options {
            args.extend(format_option(key, value));
        }
        args
    }
}

/// `-x` for a one-character name, `--name` otherwise
pub fn format_flag(name: &str) -> String {
    if is_short(name) {
        format!("-{}", name)
    } else {
        format!("--{}", name)
    }
}

/// `["-k", "value"]` for a one-character key, `["--key=value"]` otherwise
pub fn format_option(key: &str, value: &str) -> Vec<String> {
    if is_short(key) {
        vec![format!("-{}", key), value.to_string()]
    } else {
        vec![format!("--{}={}", key, value)]
    }
}

fn is_short(name: &str) -> bool {
    name.chars().count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flag() {
        assert_eq!(format_flag("l"), "-l");
        assert_eq!(format_flag("all"), "--all");
        assert_eq!(format_flag("é"), "-é");
    }

    #[test]
    fn test_format_option() {
        assert_eq!(format_option("n", "5"), ["-n", "5"]);
        assert_eq!(format_option("lines", "5"), ["--lines=5"]);
        assert_eq!(format_option("f", "a b"), ["-f", "a b"]);
    }

    #[test]
    fn test_flags_render_before_options_in_order() {
        let options = CommandOptions::new()
            .option("width", 80)
            .flag("s")
            .option("n", 3)
            .flag("reverse");

        assert_eq!(
            options.to_args(),
            ["-s", "--reverse", "--width=80", "-n", "3"]
        );
        assert!(!options.is_empty());
        assert_eq!(options.flags().len(), 2);
        assert_eq!(options.options()[1], ("n".to_string(), "3".to_string()));
    }

    #[test]
    fn test_empty_options_render_nothing() {
        assert!(CommandOptions::new().to_args().is_empty());
        assert!(CommandOptions::default().is_empty());
    }
}
