// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! # pipewright - external-process pipelines as values
//!
//! `pipewright` describes chains of external commands joined by OS pipes,
//! and runs them when their results are first needed.
//!
//! ## Features
//!
//! - **Composable** - pipe, redirect, and capture without starting anything
//! - **Lazy** - a pipeline runs once, when its output or status is read
//! - **Real pipes** - stages talk through kernel pipes, no shell involved
//! - **Discovery** - build a command registry from a search path
//!
//! ## Quick Start
//!
//! ```no_run
//! use pipewright::{CommandRegistry, PipewrightResult};
//!
//! fn main() -> PipewrightResult<()> {
//!     let commands = CommandRegistry::from_env();
//!     let seq = commands.resolve("seq")?;
//!     let sort = commands.resolve("sort")?;
//!
//!     let mut pipeline = seq.build([1, 10]).pipe_to(sort.build(["-rn"]))?;
//!     println!("{}", pipeline.output_text()?.unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod command;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod pipeline;
pub mod process;
pub mod utils;

// Re-export commonly used types
pub use command::{CommandBinding, CommandOptions};
pub use config::Settings;
pub use discovery::{list_executables, CommandRegistry, Executable};
pub use errors::{PipewrightError, PipewrightResult};
pub use pipeline::Pipeline;
pub use process::{ProcessSpec, SharedBuffer, StreamBinding};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
