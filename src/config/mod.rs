// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Settings loading
//!
//! Settings come from `pipewright.toml` in the working directory, or the
//! per-user config directory, unless a file is named explicitly.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{PipewrightError, PipewrightResult};

/// Project-local settings file name
pub const LOCAL_FILE: &str = "pipewright.toml";

/// Environment variable naming an explicit settings file
pub const CONFIG_ENV: &str = "PIPEWRIGHT_CONFIG";

/// Effective settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Directories scanned for executables, before `PATH`
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Also scan the directories of `PATH`
    #[serde(default = "default_true")]
    pub use_env_path: bool,

    /// Report the rightmost failing stage instead of the last stage
    #[serde(default)]
    pub pipefail: bool,

    /// Extra environment for launched stages
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            use_env_path: true,
            pipefail: false,
            env: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load settings
    ///
    /// An explicit file must exist. Otherwise the first of
    /// `./pipewright.toml` and `<config dir>/pipewright/config.toml` that
    /// exists is used, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> PipewrightResult<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(PipewrightError::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_file(path);
        }

        for candidate in default_locations() {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("no settings file found, using defaults");
        Ok(Self::default())
    }

    /// Parse one settings file
    pub fn from_file(path: &Path) -> PipewrightResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PipewrightError::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let settings = Self::from_toml(&content)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(content: &str) -> PipewrightResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> PipewrightResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Directories to scan, configured ones first, then `PATH` if enabled
    pub fn search_path(&self) -> Vec<PathBuf> {
        let mut dirs = self.search_paths.clone();
        if self.use_env_path {
            if let Some(path) = env::var_os("PATH") {
                dirs.extend(env::split_paths(&path));
            }
        }
        dirs
    }
}

fn default_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(LOCAL_FILE)];
    if let Some(dirs) = ProjectDirs::from("", "", "pipewright") {
        locations.push(dirs.config_dir().join("config.toml"));
    }
    locations
}
