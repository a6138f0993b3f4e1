// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Name-to-executable registry built from a search path

use std::collections::btree_map::{self, BTreeMap};
use std::env;
use std::path::PathBuf;

use tracing::debug;

use super::list_executables;
use crate::command::CommandBinding;
use crate::config::Settings;
use crate::errors::PipewrightResult;

/// Commands available by name
///
/// When several directories provide the same name, the earliest directory
/// in the search path wins, as with `PATH` lookup.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, CommandBinding>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan each directory in order
    pub fn from_search_path<I>(dirs: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let mut commands = BTreeMap::new();
        for dir in dirs {
            let dir = dir.into();
            let before = commands.len();
            for exe in list_executables(&dir) {
                commands
                    .entry(exe.name)
                    .or_insert_with(|| CommandBinding::new(exe.path));
            }
            debug!(
                dir = %dir.display(),
                added = commands.len() - before,
                "scanned directory"
            );
        }
        Self { commands }
    }

    /// Scan the directories of `PATH`
    pub fn from_env() -> Self {
        match env::var_os("PATH") {
            Some(path) => Self::from_search_path(env::split_paths(&path)),
            None => Self::default(),
        }
    }

    /// Scan the effective search path of `settings`
    pub fn from_settings(settings: &Settings) -> Self {
        Self::from_search_path(settings.search_path())
    }

    pub fn get(&self, name: &str) -> Option<&CommandBinding> {
        self.commands.get(name)
    }

    /// Look `name` up in the registry, then through `PATH`
    pub fn resolve(&self, name: &str) -> PipewrightResult<CommandBinding> {
        match self.get(name) {
            Some(binding) => Ok(binding.clone()),
            None => CommandBinding::which(name),
        }
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CommandBinding> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl<'a> IntoIterator for &'a CommandRegistry {
    type Item = (&'a String, &'a CommandBinding);
    type IntoIter = btree_map::Iter<'a, String, CommandBinding>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
