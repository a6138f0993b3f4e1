// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Command bindings
//!
//! A binding names one executable and turns arguments into single-stage
//! pipelines. It never runs anything itself.

mod options;

pub use options::{format_flag, format_option, CommandOptions};

use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{PipewrightError, PipewrightResult};
use crate::pipeline::Pipeline;
use crate::process::{ProcessSpec, StreamBinding};

/// A reusable handle to an executable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandBinding {
    path: PathBuf,
}

impl CommandBinding {
    /// Bind an executable by path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve `name` through `PATH`
    pub fn which(name: &str) -> PipewrightResult<Self> {
        which::which(name)
            .map(Self::new)
            .map_err(|_| PipewrightError::command_not_found(name))
    }

    /// Basename of the executable
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A pipeline running the executable with positional arguments
    pub fn build<I>(&self, args: I) -> Pipeline
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        self.build_with(&CommandOptions::default(), args)
    }

    /// A pipeline running the executable with options, then positional
    /// arguments
    pub fn build_with<I>(&self, options: &CommandOptions, args: I) -> Pipeline
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let program = self.path.to_string_lossy().into_owned();
        let args = options
            .to_args()
            .into_iter()
            .chain(args.into_iter().map(|arg| arg.to_string()));

        Pipeline::from_spec(ProcessSpec::from_program(program, args))
    }

    /// A pipeline running the executable without arguments
    pub fn call(&self) -> Pipeline {
        self.build(std::iter::empty::<String>())
    }

    /// Shorthand for `self.call().pipe_to(next)`
    pub fn pipe_to(&self, next: impl Into<Pipeline>) -> PipewrightResult<Pipeline> {
        self.call().pipe_to(next)
    }

    /// Shorthand for `self.call().redirect_output_to(sink)`
    pub fn redirect_output_to(&self, sink: impl Into<StreamBinding>) -> PipewrightResult<Pipeline> {
        self.call().redirect_output_to(sink)
    }

    /// Shorthand for `self.call().redirect_input_from(source)`
    pub fn redirect_input_from(
        &self,
        source: impl Into<StreamBinding>,
    ) -> PipewrightResult<Pipeline> {
        self.call().redirect_input_from(source)
    }
}

impl fmt::Display for CommandBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl From<CommandBinding> for Pipeline {
    fn from(binding: CommandBinding) -> Self {
        binding.call()
    }
}

impl From<&CommandBinding> for Pipeline {
    fn from(binding: &CommandBinding) -> Self {
        binding.call()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SharedBuffer;

    fn binding(name: &str) -> CommandBinding {
        CommandBinding::which(name).unwrap()
    }

    #[test]
    fn test_name_and_display() {
        let ls = CommandBinding::new("/usr/bin/ls");
        assert_eq!(ls.name(), "ls");
        assert_eq!(ls.to_string(), "/usr/bin/ls");
        assert_eq!(ls.path(), Path::new("/usr/bin/ls"));
    }

    #[test]
    fn test_build_orders_options_before_positionals() {
        let head = CommandBinding::new("/usr/bin/head");
        let options = CommandOptions::new().flag("q").option("bytes", 10).option("n", 2);

        let pipeline = head.build_with(&options, ["a.txt", "b.txt"]);
        assert_eq!(
            pipeline.stages()[0].argv(),
            ["/usr/bin/head", "-q", "--bytes=10", "-n", "2", "a.txt", "b.txt"]
        );
    }

    #[test]
    fn test_build_stringifies_positionals() {
        let seq = CommandBinding::new("/usr/bin/seq");
        assert_eq!(seq.build([1, 5]).to_string(), "/usr/bin/seq 1 5");
        assert_eq!(seq.call().to_string(), "/usr/bin/seq");
    }

    #[test]
    fn test_which_missing_command() {
        let err = CommandBinding::which("pipewright-no-such-command").unwrap_err();
        assert!(matches!(err, PipewrightError::CommandNotFound { .. }));
    }

    #[test]
    fn test_binding_coerces_when_composed() {
        let echo = binding("echo");
        let tr = binding("tr");

        let mut chain = echo
            .build(["hello"])
            .pipe_to(tr.build(["a-z", "A-Z"]))
            .unwrap();
        assert_eq!(chain.output_text().unwrap().as_deref(), Some("HELLO\n"));

        let cat = binding("cat");
        let sink = SharedBuffer::new();
        let mut chain = cat
            .redirect_input_from(StreamBinding::bytes("piped"))
            .unwrap()
            .pipe_to(&cat)
            .unwrap()
            .redirect_output_to(sink.clone())
            .unwrap();
        assert!(chain.success().unwrap());
        assert_eq!(chain.len(), 2);
        assert_eq!(sink.to_string_lossy(), "piped");
    }
}
