// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Process specification
//!
//! One external command invocation, described but not yet started.

use std::fmt;
use std::mem;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus};

use tracing::{debug, trace};

use super::relay::StageRelays;
use super::stream::StreamBinding;
use super::{LaunchOptions, Launcher};
use crate::errors::{PipewrightError, PipewrightResult};

/// An external command plus the three streams it will be wired to
#[derive(Debug)]
pub struct ProcessSpec {
    argv: Vec<String>,
    input: StreamBinding,
    output: StreamBinding,
    error: StreamBinding,
    child: Option<Child>,
    exit_code: Option<i32>,
}

impl ProcessSpec {
    /// Describe a command; `argv[0]` is the program to run
    pub fn new<I, S>(argv: I) -> PipewrightResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        if argv.is_empty() {
            return Err(PipewrightError::EmptyCommand);
        }
        Ok(Self::with_argv(argv))
    }

    /// Describe a command from its program and arguments
    pub fn from_program<I>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut argv = vec![program.into()];
        argv.extend(args);
        Self::with_argv(argv)
    }

    fn with_argv(argv: Vec<String>) -> Self {
        Self {
            argv,
            input: StreamBinding::Inherit,
            output: StreamBinding::Inherit,
            error: StreamBinding::Inherit,
            child: None,
            exit_code: None,
        }
    }

    /// The full argument vector, program first
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// The program to run
    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    /// Arguments after the program
    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn input(&self) -> &StreamBinding {
        &self.input
    }

    pub fn output(&self) -> &StreamBinding {
        &self.output
    }

    pub fn error(&self) -> &StreamBinding {
        &self.error
    }

    /// Whether the stage has been started
    pub fn is_launched(&self) -> bool {
        self.child.is_some()
    }

    /// Exit code, once the stage has been reaped
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Bind the stage's input; the binding must be readable
    pub fn set_input(&mut self, binding: StreamBinding) -> PipewrightResult<()> {
        self.ensure_unlaunched()?;
        if !binding.is_readable() {
            return Err(PipewrightError::composition(
                "redirect input",
                format!("a {} binding cannot be read from", binding.kind()),
            ));
        }
        self.input = binding;
        Ok(())
    }

    /// Bind the stage's output; the binding must be writable
    pub fn set_output(&mut self, binding: StreamBinding) -> PipewrightResult<()> {
        self.ensure_unlaunched()?;
        if !binding.is_writable() {
            return Err(PipewrightError::composition(
                "redirect output",
                format!("a {} binding cannot be written to", binding.kind()),
            ));
        }
        self.output = binding;
        Ok(())
    }

    /// Bind the stage's error stream; the binding must be writable
    pub fn set_error(&mut self, binding: StreamBinding) -> PipewrightResult<()> {
        self.ensure_unlaunched()?;
        if !binding.is_writable() {
            return Err(PipewrightError::composition(
                "redirect error",
                format!("a {} binding cannot be written to", binding.kind()),
            ));
        }
        self.error = binding;
        Ok(())
    }

    /// Start the process
    ///
    /// The bindings are moved into the child; descriptors held by this
    /// process are closed as soon as the spawn returns. The returned relays
    /// must be started for in-memory bindings to make progress.
    pub fn launch(
        &mut self,
        launcher: &dyn Launcher,
        options: &LaunchOptions,
    ) -> PipewrightResult<StageRelays> {
        self.ensure_unlaunched()?;

        let (stdin, source) = mem::take(&mut self.input).into_input();
        let (stdout, output) = mem::take(&mut self.output).into_output();
        let (stderr, error) = mem::take(&mut self.error).into_output();

        let mut command = Command::new(self.program());
        command.args(self.args()).stdin(stdin).stdout(stdout).stderr(stderr);
        options.apply(&mut command);

        let spawned = launcher.spawn(&mut command);
        drop(command);

        let mut child = spawned.map_err(|e| PipewrightError::launch(self.program(), &e))?;
        debug!(
            program = %self.program(),
            args = self.args().len(),
            pid = child.id(),
            "launched stage"
        );

        let relays = StageRelays::attach(&mut child, source, output, error);
        self.child = Some(child);
        Ok(relays)
    }

    /// Block until the process exits and reap it
    ///
    /// Returns `None` if the stage was never launched. A process killed by
    /// a signal reports `128 + signal`, as shells do.
    pub fn wait(&mut self) -> PipewrightResult<Option<i32>> {
        if let Some(code) = self.exit_code {
            return Ok(Some(code));
        }
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };

        let code = exit_code(child.wait()?);
        trace!(program = %self.argv[0], code, "reaped stage");
        self.exit_code = Some(code);
        Ok(Some(code))
    }

    /// Terminate a running stage and reap it
    pub(crate) fn kill(&mut self) -> PipewrightResult<()> {
        if self.exit_code.is_some() {
            return Ok(());
        }
        if let Some(child) = self.child.as_mut() {
            // Already exited is fine; wait() below still reaps it.
            let _ = child.kill();
        }
        self.wait().map(|_| ())
    }

    /// Drop all bindings, closing any descriptors they hold
    pub(crate) fn release_bindings(&mut self) {
        self.input = StreamBinding::Inherit;
        self.output = StreamBinding::Inherit;
        self.error = StreamBinding::Inherit;
    }

    fn ensure_unlaunched(&self) -> PipewrightResult<()> {
        if self.child.is_some() {
            return Err(PipewrightError::AlreadyLaunched {
                command: self.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or_default())
}
