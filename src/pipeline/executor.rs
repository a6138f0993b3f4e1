// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Pipeline execution
//!
//! Launches every stage in declaration order, then waits on each in the
//! same order. The chain's status is the terminal stage's exit code unless
//! pipefail was requested.

use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use super::chain::{Pipeline, State};
use crate::errors::PipewrightResult;
use crate::process::{CapturedStreams, ProcessSpec, RunningRelays, StreamBinding};

/// Results of a completed pipeline
#[derive(Debug, Clone)]
pub(super) struct Outcome {
    status: i32,
    stage_statuses: Vec<i32>,
    output: Option<Vec<u8>>,
    error: Option<Vec<u8>>,
}

impl Pipeline {
    /// Run the pipeline now
    ///
    /// Does nothing if the pipeline has already run. A failed launch is
    /// returned here and again from every later result accessor.
    pub fn execute(&mut self) -> PipewrightResult<()> {
        self.ensure_executed().map(|_| ())
    }

    /// Run the pipeline and hand it back for inspection
    pub fn run(mut self) -> PipewrightResult<Self> {
        self.execute()?;
        Ok(self)
    }

    /// Bytes the terminal stage wrote to its output
    ///
    /// Executes the pipeline if needed. When this triggers execution, both
    /// terminal streams left unset are captured, so the error stream stays
    /// readable too. `None` means the output went elsewhere (inherited
    /// through `execute()`, or redirected).
    pub fn output(&mut self) -> PipewrightResult<Option<&[u8]>> {
        self.capture_unset_streams()?;
        Ok(self.ensure_executed()?.output.as_deref())
    }

    /// The output decoded as UTF-8, replacing invalid sequences
    pub fn output_text(&mut self) -> PipewrightResult<Option<String>> {
        Ok(self
            .output()?
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Bytes the terminal stage wrote to its error stream
    ///
    /// Same capture rule as [`Pipeline::output`].
    pub fn error(&mut self) -> PipewrightResult<Option<&[u8]>> {
        self.capture_unset_streams()?;
        Ok(self.ensure_executed()?.error.as_deref())
    }

    /// The error stream decoded as UTF-8, replacing invalid sequences
    pub fn error_text(&mut self) -> PipewrightResult<Option<String>> {
        Ok(self
            .error()?
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned()))
    }

    /// Exit code of the chain
    pub fn status(&mut self) -> PipewrightResult<i32> {
        Ok(self.ensure_executed()?.status)
    }

    /// Whether the chain exited with status zero
    pub fn success(&mut self) -> PipewrightResult<bool> {
        Ok(self.status()? == 0)
    }

    /// Exit code of every stage, in declaration order
    pub fn stage_statuses(&mut self) -> PipewrightResult<&[i32]> {
        Ok(&self.ensure_executed()?.stage_statuses)
    }

    /// Bind `Capture` to unset terminal streams of an unexecuted pipeline
    fn capture_unset_streams(&mut self) -> PipewrightResult<()> {
        if self.is_executed() {
            return Ok(());
        }
        let terminal = self.terminal_mut();
        if terminal.output().is_inherit() {
            terminal.set_output(StreamBinding::Capture)?;
        }
        if terminal.error().is_inherit() {
            terminal.set_error(StreamBinding::Capture)?;
        }
        Ok(())
    }

    fn ensure_executed(&mut self) -> PipewrightResult<&Outcome> {
        if let State::Unexecuted = self.state {
            self.state = match self.execute_stages() {
                Ok(outcome) => State::Completed(outcome),
                Err(error) => State::Aborted(error),
            };
        }
        self.state.outcome()
    }

    fn execute_stages(&mut self) -> PipewrightResult<Outcome> {
        debug!(pipeline = %self, stages = self.stages.len(), "executing pipeline");

        let launcher = Arc::clone(&self.launcher);
        let mut relays = Vec::with_capacity(self.stages.len());
        for index in 0..self.stages.len() {
            match self.stages[index].launch(launcher.as_ref(), &self.options) {
                Ok(stage_relays) => relays.push(stage_relays),
                Err(error) => {
                    drop(relays);
                    self.abort(index);
                    return Err(error);
                }
            }
        }

        let pipefail = self.pipefail;
        let stages = &mut self.stages;

        thread::scope(|scope| -> PipewrightResult<Outcome> {
            let running: Vec<RunningRelays<'_>> =
                relays.into_iter().map(|relay| relay.start(scope)).collect();

            let mut stage_statuses = Vec::with_capacity(stages.len());
            for index in 0..stages.len() {
                let code = match stages[index].wait() {
                    Ok(code) => code.unwrap_or_default(),
                    Err(error) => {
                        reap(&mut stages[index..]);
                        return Err(error);
                    }
                };
                debug!(stage = %stages[index], code, "stage finished");
                stage_statuses.push(code);
            }

            // Capture bindings only exist on the terminal stage, whose relays come last.
            let mut captured = CapturedStreams::default();
            for relay in running {
                captured = relay.finish()?;
            }

            let status = if pipefail {
                stage_statuses
                    .iter()
                    .rev()
                    .copied()
                    .find(|&code| code != 0)
                    .unwrap_or(0)
            } else {
                stage_statuses.last().copied().unwrap_or_default()
            };

            Ok(Outcome {
                status,
                stage_statuses,
                output: captured.output,
                error: captured.error,
            })
        })
    }

    /// Clean up after stage `failed` could not be launched
    fn abort(&mut self, failed: usize) {
        for stage in &mut self.stages[failed..] {
            stage.release_bindings();
        }
        reap(&mut self.stages[..failed]);
    }
}

/// Kill and reap launched stages after a failure
fn reap(stages: &mut [ProcessSpec]) {
    for stage in stages {
        if let Err(error) = stage.kill() {
            warn!(stage = %stage, %error, "failed to reap stage after aborted run");
        }
    }
}
