// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_spec_path;

/// Command-line arguments for `ogc-runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ogc-runner",
    version,
    about = "Run shell commands, scripts and executables from a declarative spec.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the spec file (TOML).
    ///
    /// Default: `Runner.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value_os_t = default_spec_path())]
    pub spec: PathBuf,

    /// Only run runners with this name.
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `OGC_RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the recognised option keys and exit.
    #[arg(long)]
    pub list_options: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_runner_toml() {
        let args = CliArgs::try_parse_from(["ogc-runner"]).unwrap();
        assert_eq!(args.spec, PathBuf::from("Runner.toml"));
        assert!(!args.dry_run);
        assert!(args.task.is_none());
    }

    #[test]
    fn parses_task_filter_and_level() {
        let args = CliArgs::try_parse_from([
            "ogc-runner",
            "--spec",
            "ci/spec.toml",
            "--task",
            "teardown",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.spec, PathBuf::from("ci/spec.toml"));
        assert_eq!(args.task.as_deref(), Some("teardown"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
