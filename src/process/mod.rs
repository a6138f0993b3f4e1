// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Process specifications and stream wiring
//!
//! This module provides the single-stage building blocks: the process
//! description, its stream bindings, the relays servicing in-memory
//! bindings and the launcher seam used to spawn children.

mod relay;
mod spec;
mod stream;

pub use relay::{CapturedStreams, RunningRelays, StageRelays};
pub use spec::ProcessSpec;
pub use stream::{SharedBuffer, StreamBinding};

use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::{Child, Command};

/// Spawns prepared commands
///
/// The command arrives with its program, arguments, streams and options
/// already set; implementations only decide how it is started.
pub trait Launcher: Send + Sync {
    /// Start the command
    fn spawn(&self, command: &mut Command) -> io::Result<Child>;
}

/// Launcher that spawns directly through the OS
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn spawn(&self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}

/// Settings applied to every stage of a pipeline when it is launched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Working directory for the children
    pub current_dir: Option<PathBuf>,

    /// Extra environment variables, passed through verbatim
    pub env: BTreeMap<String, String>,
}

impl LaunchOptions {
    pub(crate) fn apply(&self, command: &mut Command) {
        if let Some(ref dir) = self.current_dir {
            command.current_dir(dir);
        }
        command.envs(&self.env);
    }
}
