// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Executable discovery
//!
//! Walks directories for files the current user may execute and builds
//! the command registry from them.

mod registry;

pub use registry::CommandRegistry;

use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

/// An executable found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Executable {
    /// File name, used as the command name
    pub name: String,
    /// Full path to the file
    pub path: PathBuf,
}

/// Every executable file under `root`, recursively
///
/// Entries of a directory are visited in name order. Symlinked directories
/// are not descended into; symlinked files are included when their target
/// is executable. A missing root yields nothing.
pub fn list_executables(root: &Path) -> Vec<Executable> {
    let mut found = Vec::new();
    if root.is_dir() {
        collect(root, &mut found);
    }
    found
}

fn collect(dir: &Path, found: &mut Vec<Executable>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(dir = %dir.display(), %error, "skipping unreadable directory");
            return;
        }
    };

    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            collect(&path, found);
        } else if path.is_file() && is_executable(&path) {
            found.push(Executable {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
            });
        }
    }
}

/// Whether the current user may execute `path`
pub fn is_executable(path: &Path) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the whole call.
    unsafe { libc::access(c_path.as_ptr(), libc::X_OK) == 0 }
}
