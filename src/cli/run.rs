// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewright contributors

//! Run command - execute a pipeline given on the command line

use colored::Colorize;
use miette::Result;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use tracing::debug;

use super::{report, STAGE_SEPARATOR};
use crate::command::CommandBinding;
use crate::config::Settings;
use crate::discovery::CommandRegistry;
use crate::errors::{PipewrightError, PipewrightResult};
use crate::pipeline::Pipeline;

/// Options of one `run` invocation
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub append: bool,
    pub pipefail: bool,
    pub dry_run: bool,
}

/// Build and run the pipeline, returning the exit status for the process
pub fn run(
    argv: Vec<String>,
    options: RunOptions,
    settings: &Settings,
    verbose: bool,
) -> Result<i32> {
    let registry = CommandRegistry::from_settings(settings);
    let pipeline = build(&argv, &registry, settings, options.pipefail).map_err(report)?;

    if options.dry_run {
        println!("{}", describe(&pipeline, &options));
        return Ok(0);
    }

    let pipeline = redirect(pipeline, &options)?;
    if verbose {
        eprintln!("{} {}", "Running".bold(), pipeline.to_string().cyan());
    }

    let mut pipeline = pipeline.run().map_err(report)?;
    let status = pipeline.status().map_err(report)?;
    debug!(status, stages = pipeline.len(), "pipeline finished");

    if verbose && status != 0 {
        let statuses = pipeline.stage_statuses().map_err(report)?;
        eprintln!("{} {:?}", "Stage statuses:".yellow(), statuses);
    }

    Ok(status)
}

/// Split `argv` into stages at each literal `|`
pub fn split_stages(argv: &[String]) -> PipewrightResult<Vec<&[String]>> {
    let stages: Vec<&[String]> = argv.split(|arg| arg == STAGE_SEPARATOR).collect();
    if stages.iter().any(|stage| stage.is_empty()) {
        return Err(PipewrightError::EmptyCommand);
    }
    Ok(stages)
}

/// Resolve every stage and pipe them together
pub fn build(
    argv: &[String],
    registry: &CommandRegistry,
    settings: &Settings,
    pipefail: bool,
) -> PipewrightResult<Pipeline> {
    let stages = split_stages(argv)?
        .into_iter()
        .map(|stage| resolve_stage(stage, registry))
        .collect::<PipewrightResult<Vec<_>>>()?;

    let pipeline = Pipeline::chain(stages)?.pipefail(pipefail || settings.pipefail);
    Ok(settings
        .env
        .iter()
        .fold(pipeline, |pipeline, (key, value)| pipeline.env(key, value)))
}

fn resolve_stage(stage: &[String], registry: &CommandRegistry) -> PipewrightResult<Pipeline> {
    let program = &stage[0];
    let binding = if program.contains('/') {
        CommandBinding::new(program)
    } else {
        registry.resolve(program)?
    };
    Ok(binding.build(&stage[1..]))
}

fn redirect(mut pipeline: Pipeline, options: &RunOptions) -> Result<Pipeline> {
    if let Some(path) = &options.input {
        let file = File::open(path).map_err(|e| {
            miette::miette!("Failed to open input '{}': {}", path.display(), e)
        })?;
        pipeline = pipeline.redirect_input_from(file).map_err(report)?;
    }

    if let Some(path) = &options.output {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(options.append)
            .truncate(!options.append)
            .open(path)
            .map_err(|e| miette::miette!("Failed to open output '{}': {}", path.display(), e))?;
        pipeline = pipeline.redirect_output_to(file).map_err(report)?;
    }

    Ok(pipeline)
}

/// Shell-equivalent text of the pipeline with its redirections
pub fn describe(pipeline: &Pipeline, options: &RunOptions) -> String {
    let mut text = pipeline.to_string();
    if let Some(path) = &options.input {
        text.push_str(&format!(" < {}", path.display()));
    }
    if let Some(path) = &options.output {
        let op = if options.append { ">>" } else { ">" };
        text.push_str(&format!(" {} {}", op, path.display()));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_split_stages() {
        let argv = args("ls -l | grep x | wc -l");
        let stages = split_stages(&argv).unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[1], ["grep", "x"]);
    }

    #[test]
    fn test_split_rejects_empty_stage() {
        for line in ["| wc", "ls |", "ls | | wc"] {
            let err = split_stages(&args(line)).unwrap_err();
            assert!(matches!(err, PipewrightError::EmptyCommand), "{}", line);
        }
    }

    #[test]
    fn test_pipe_inside_argument_is_not_a_separator() {
        let argv = vec!["grep".to_string(), "a|b".to_string()];
        assert_eq!(split_stages(&argv).unwrap().len(), 1);
    }

    #[test]
    fn test_build_and_describe() {
        let registry = CommandRegistry::new();
        let settings = Settings::default();
        let argv = args("/bin/echo hi | /usr/bin/env tr a-z A-Z");
        let pipeline = build(&argv, &registry, &settings, false).unwrap();

        let options = RunOptions {
            input: Some(PathBuf::from("in.txt")),
            output: Some(PathBuf::from("out.txt")),
            append: true,
            ..RunOptions::default()
        };
        assert_eq!(
            describe(&pipeline, &options),
            "/bin/echo hi | /usr/bin/env tr a-z A-Z < in.txt >> out.txt"
        );
    }

    #[test]
    fn test_build_unknown_command() {
        let err = build(
            &args("pipewright-no-such-command"),
            &CommandRegistry::new(),
            &Settings::default(),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, PipewrightError::CommandNotFound { .. }));
    }

    #[test]
    fn test_settings_env_reaches_stages() {
        let mut settings = Settings::default();
        settings.env.insert("PIPEWRIGHT_TEST_VALUE".into(), "42".into());

        let mut pipeline = build(
            &args("printenv PIPEWRIGHT_TEST_VALUE"),
            &CommandRegistry::new(),
            &settings,
            false,
        )
        .unwrap();
        assert_eq!(pipeline.launch_options().env.len(), 1);
        assert_eq!(pipeline.output_text().unwrap().as_deref(), Some("42\n"));
    }

    #[test]
    fn test_redirect_to_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        std::fs::write(&input, "b\na\n").unwrap();

        let options = RunOptions {
            input: Some(input),
            output: Some(output.clone()),
            ..RunOptions::default()
        };
        let pipeline = build(
            &args("sort"),
            &CommandRegistry::new(),
            &Settings::default(),
            false,
        )
        .unwrap();
        let mut pipeline = redirect(pipeline, &options).unwrap().run().unwrap();

        assert!(pipeline.success().unwrap());
        assert_eq!(std::fs::read_to_string(output).unwrap(), "a\nb\n");
    }
}
