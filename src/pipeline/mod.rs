// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Pipeline composition and execution
//!
//! This module defines the chain of stages, how chains are joined and
//! redirected, and how they are executed and inspected.

mod chain;
mod executor;

pub use chain::Pipeline;
