// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Utility modules
//!
//! Common utilities for the pipewright CLI.

pub mod colors;
