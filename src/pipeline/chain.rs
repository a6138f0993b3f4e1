// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Pipeline composition
//!
//! A pipeline starts as one stage and grows by piping into further
//! pipelines and by redirecting its ends. Nothing runs until a result is
//! asked for.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::trace;

use super::executor::Outcome;
use crate::errors::{PipewrightError, PipewrightResult};
use crate::process::{LaunchOptions, Launcher, ProcessSpec, StreamBinding, SystemLauncher};

/// Execution state of a pipeline
pub(super) enum State {
    Unexecuted,
    Completed(Outcome),
    Aborted(PipewrightError),
}

impl State {
    pub(super) fn outcome(&self) -> PipewrightResult<&Outcome> {
        match self {
            Self::Completed(outcome) => Ok(outcome),
            Self::Aborted(error) => Err(error.clone()),
            Self::Unexecuted => Err(PipewrightError::composition(
                "read results",
                "the pipeline has not been executed",
            )),
        }
    }
}

/// An ordered chain of stages connected by pipes
pub struct Pipeline {
    pub(super) stages: Vec<ProcessSpec>,
    pub(super) launcher: Arc<dyn Launcher>,
    pub(super) options: LaunchOptions,
    pub(super) pipefail: bool,
    pub(super) state: State,
}

impl Pipeline {
    /// A single-stage pipeline running `argv`
    pub fn new<I, S>(argv: I) -> PipewrightResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self::from_spec(ProcessSpec::new(argv)?))
    }

    /// Wrap an unlaunched stage
    pub fn from_spec(spec: ProcessSpec) -> Self {
        Self {
            stages: vec![spec],
            launcher: Arc::new(SystemLauncher),
            options: LaunchOptions::default(),
            pipefail: false,
            state: State::Unexecuted,
        }
    }

    /// Pipe a sequence of pipelines together, left to right
    pub fn chain<I, P>(parts: I) -> PipewrightResult<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Pipeline>,
    {
        let mut parts = parts.into_iter();
        let first: Pipeline = parts.next().ok_or(PipewrightError::EmptyCommand)?.into();
        parts.try_fold(first, |chain: Pipeline, next| chain.pipe_to(next))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────

    /// Spawn stages through a different launcher
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Run every stage in `dir`
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.current_dir = Some(dir.into());
        self
    }

    /// Set an environment variable for every stage
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    /// Report the rightmost failing stage instead of the terminal stage
    pub fn pipefail(mut self, enabled: bool) -> Self {
        self.pipefail = enabled;
        self
    }

    /// Launch options applied to every stage
    pub fn launch_options(&self) -> &LaunchOptions {
        &self.options
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Composition
    // ─────────────────────────────────────────────────────────────────────────

    /// Connect this pipeline's output to the input of `next`
    ///
    /// One OS pipe is allocated: its write end becomes this pipeline's
    /// terminal output and its read end the first input of `next`. The
    /// stages of `next` are appended; its own launcher and options are
    /// discarded in favour of this pipeline's.
    ///
    /// Captured streams belong to the terminal stage only, so a left
    /// operand whose terminal output or error is `Capture` is rejected.
    pub fn pipe_to(mut self, next: impl Into<Pipeline>) -> PipewrightResult<Self> {
        let mut next = next.into();
        if self.is_executed() || next.is_executed() {
            return Err(PipewrightError::composition(
                "pipe",
                "an operand has already been executed",
            ));
        }
        let terminal = self.terminal();
        if matches!(terminal.output(), StreamBinding::Capture)
            || matches!(terminal.error(), StreamBinding::Capture)
        {
            return Err(PipewrightError::composition(
                "pipe",
                "only the last stage of a pipeline can capture a stream",
            ));
        }

        let (reader, writer) = io::pipe()?;
        trace!(from = %self, to = %next, "allocated pipe");

        self.terminal_mut().set_output(writer.into())?;
        next.stages[0].set_input(reader.into())?;
        self.stages.append(&mut next.stages);

        Ok(self)
    }

    /// Send the terminal stage's output to a writable endpoint
    pub fn redirect_output_to(mut self, sink: impl Into<StreamBinding>) -> PipewrightResult<Self> {
        self.ensure_composable("redirect output")?;
        self.terminal_mut().set_output(sink.into())?;
        Ok(self)
    }

    /// Send the terminal stage's error stream to a writable endpoint
    pub fn redirect_error_to(mut self, sink: impl Into<StreamBinding>) -> PipewrightResult<Self> {
        self.ensure_composable("redirect error")?;
        self.terminal_mut().set_error(sink.into())?;
        Ok(self)
    }

    /// Feed the first stage from a readable endpoint
    pub fn redirect_input_from(mut self, source: impl Into<StreamBinding>) -> PipewrightResult<Self> {
        self.set_input(source)?;
        Ok(self)
    }

    /// Collect the terminal stage's output in memory
    pub fn capture_output(self) -> PipewrightResult<Self> {
        self.redirect_output_to(StreamBinding::Capture)
    }

    /// Collect the terminal stage's error stream in memory
    pub fn capture_error(self) -> PipewrightResult<Self> {
        self.redirect_error_to(StreamBinding::Capture)
    }

    /// Bind the first stage's input in place
    pub fn set_input(&mut self, source: impl Into<StreamBinding>) -> PipewrightResult<()> {
        self.ensure_input_open()?;
        self.stages[0].set_input(source.into())
    }

    /// The first stage's input binding
    pub fn input(&self) -> PipewrightResult<&StreamBinding> {
        self.ensure_input_open()?;
        Ok(self.stages[0].input())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// The stages, in execution order
    pub fn stages(&self) -> &[ProcessSpec] {
        &self.stages
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false: a pipeline holds at least one stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Whether execution has been attempted
    pub fn is_executed(&self) -> bool {
        !matches!(self.state, State::Unexecuted)
    }

    pub(super) fn terminal(&self) -> &ProcessSpec {
        &self.stages[self.stages.len() - 1]
    }

    pub(super) fn terminal_mut(&mut self) -> &mut ProcessSpec {
        let last = self.stages.len() - 1;
        &mut self.stages[last]
    }

    fn ensure_composable(&self, operation: &str) -> PipewrightResult<()> {
        if self.is_executed() {
            return Err(PipewrightError::composition(
                operation,
                "the pipeline has already been executed",
            ));
        }
        Ok(())
    }

    fn ensure_input_open(&self) -> PipewrightResult<()> {
        if self.is_executed() {
            return Err(PipewrightError::ClosedStream {
                pipeline: self.to_string(),
            });
        }
        Ok(())
    }
}

impl From<ProcessSpec> for Pipeline {
    fn from(spec: ProcessSpec) -> Self {
        Self::from_spec(spec)
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<sh: $ {}>", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use proptest::prelude::*;
    use std::fs::File;
    use tempfile::NamedTempFile;

    fn pipeline(argv: &[&str]) -> Pipeline {
        Pipeline::new(argv.iter().copied()).unwrap()
    }

    #[test]
    fn test_single_stage_display() {
        assert_snapshot!(pipeline(&["/bin/echo", "hello", "world"]), @"/bin/echo hello world");
    }

    #[test]
    fn test_pipe_to_concatenates_and_wires() {
        let chain = pipeline(&["echo", "hello"])
            .pipe_to(pipeline(&["tr", "a-z", "A-Z"]))
            .unwrap()
            .pipe_to(pipeline(&["wc", "-c"]))
            .unwrap();

        assert_eq!(chain.len(), 3);
        assert_snapshot!(chain, @"echo hello | tr a-z A-Z | wc -c");
        assert_eq!(format!("{:?}", chain), "<sh: $ echo hello | tr a-z A-Z | wc -c>");

        let stages = chain.stages();
        assert!(stages[0].input().is_inherit());
        assert!(matches!(stages[0].output(), StreamBinding::PipeWriter(_)));
        assert!(matches!(stages[1].input(), StreamBinding::PipeReader(_)));
        assert!(matches!(stages[1].output(), StreamBinding::PipeWriter(_)));
        assert!(matches!(stages[2].input(), StreamBinding::PipeReader(_)));
        assert!(stages[2].output().is_inherit());
    }

    #[test]
    fn test_chain_of_nothing_is_empty_command() {
        let parts: Vec<Pipeline> = Vec::new();
        assert!(matches!(
            Pipeline::chain(parts),
            Err(PipewrightError::EmptyCommand)
        ));
    }

    #[test]
    fn test_redirect_output_rejects_read_only_file() {
        let tmp = NamedTempFile::new().unwrap();
        let read_only = File::open(tmp.path()).unwrap();

        let err = pipeline(&["echo", "x"])
            .redirect_output_to(read_only)
            .unwrap_err();

        assert!(matches!(err, PipewrightError::CompositionType { .. }));
    }

    #[test]
    fn test_redirect_input_rejects_sink() {
        let err = pipeline(&["cat"])
            .redirect_input_from(crate::process::SharedBuffer::new())
            .unwrap_err();

        assert!(matches!(err, PipewrightError::CompositionType { .. }));
    }

    #[test]
    fn test_redirects_bind_the_ends() {
        let chain = pipeline(&["cat"])
            .pipe_to(pipeline(&["sort"]))
            .unwrap()
            .redirect_input_from(StreamBinding::bytes("b\na\n"))
            .unwrap()
            .capture_output()
            .unwrap()
            .capture_error()
            .unwrap();

        assert!(matches!(chain.stages()[0].input(), StreamBinding::Source(_)));
        assert!(matches!(chain.stages()[1].output(), StreamBinding::Capture));
        assert!(matches!(chain.stages()[1].error(), StreamBinding::Capture));
        assert!(chain.stages()[0].error().is_inherit());
    }

    #[test]
    fn test_pipe_from_capturing_stage_is_rejected() {
        let err = pipeline(&["sh", "-c", "echo mid >&2; echo x"])
            .capture_error()
            .unwrap()
            .pipe_to(pipeline(&["cat"]))
            .unwrap_err();
        assert!(matches!(err, PipewrightError::CompositionType { .. }));

        let err = pipeline(&["echo", "x"])
            .capture_output()
            .unwrap()
            .pipe_to(pipeline(&["cat"]))
            .unwrap_err();
        assert!(matches!(err, PipewrightError::CompositionType { .. }));
    }

    #[test]
    fn test_middle_stage_error_can_go_to_a_sink() {
        let sink = crate::process::SharedBuffer::new();
        let mut chain = pipeline(&["sh", "-c", "echo mid >&2; echo x"])
            .redirect_error_to(sink.clone())
            .unwrap()
            .pipe_to(pipeline(&["cat"]))
            .unwrap();

        assert_eq!(chain.output_text().unwrap().as_deref(), Some("x\n"));
        assert_eq!(sink.to_string_lossy(), "mid\n");
    }

    #[test]
    fn test_settings_are_kept() {
        let chain = pipeline(&["env"]).current_dir("/tmp").env("LC_ALL", "C");
        assert_eq!(chain.launch_options().current_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(chain.launch_options().env.get("LC_ALL").map(String::as_str), Some("C"));
    }

    #[test]
    fn test_input_readable_before_execution() {
        let chain = pipeline(&["cat"]);
        assert!(chain.input().unwrap().is_inherit());
        assert!(!chain.is_executed());
    }

    proptest! {
        #[test]
        fn prop_display_joins_argv(argv in prop::collection::vec("[a-zA-Z0-9_./-]{1,12}", 1..6)) {
            let built = Pipeline::new(argv.clone()).unwrap();
            prop_assert_eq!(built.to_string(), argv.join(" "));
        }

        #[test]
        fn prop_pipe_display_and_len(
            left in prop::collection::vec("[a-z]{1,8}", 1..4),
            right in prop::collection::vec("[a-z]{1,8}", 1..4),
        ) {
            let p = Pipeline::new(left.clone()).unwrap();
            let q = Pipeline::new(right.clone()).unwrap();
            let (p_text, q_text) = (p.to_string(), q.to_string());
            let (p_len, q_len) = (p.len(), q.len());

            let joined = p.pipe_to(q).unwrap();
            prop_assert_eq!(joined.to_string(), format!("{} | {}", p_text, q_text));
            prop_assert_eq!(joined.len(), p_len + q_len);
        }
    }
}
