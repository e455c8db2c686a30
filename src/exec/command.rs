// src/exec/command.rs

//! The four ways a runner turns into a process launch.
//!
//! Each function resolves its inputs (temp script, interpreter lookup,
//! argument expansion) and makes exactly one [`ProcessLauncher::launch`]
//! call. Missing binaries and scripts are reported before anything spawns.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::assets::make_executable;
use crate::env::EnvSnapshot;
use crate::errors::{Result, RunnerError};
use crate::exec::launcher::{LaunchOutcome, LaunchRequest, ProcessLauncher};

/// Interpreter line prepended to inline scripts that lack one.
pub const DEFAULT_SHEBANG: &str = "#!/bin/sh";

/// Per-attempt launch settings shared by all operations.
#[derive(Debug, Clone, Copy)]
pub struct AttemptContext<'a> {
    pub task: &'a str,
    pub env: &'a EnvSnapshot,
    pub timeout: Option<Duration>,
    pub detached: bool,
}

impl AttemptContext<'_> {
    fn request(&self, program: impl Into<PathBuf>, args: Vec<String>) -> LaunchRequest {
        LaunchRequest {
            task: self.task.to_string(),
            program: program.into(),
            args,
            env: self.env.clone(),
            timeout: self.timeout,
            detached: self.detached,
        }
    }
}

/// Launch `argv[0]` with the remaining elements as arguments.
pub async fn run_command<L>(
    launcher: &L,
    argv: &[String],
    ctx: AttemptContext<'_>,
) -> Result<LaunchOutcome>
where
    L: ProcessLauncher + ?Sized,
{
    let Some((program, args)) = argv.split_first() else {
        return Err(RunnerError::ConfigError(format!(
            "runner '{}': empty command line",
            ctx.task
        )));
    };
    launcher
        .launch(ctx.request(program, args.to_vec()))
        .await
}

/// Persist `script` to a fresh executable temp file and launch it.
///
/// The file is removed once the attempt finishes.
pub async fn run_script<L>(launcher: &L, script: &str, ctx: AttemptContext<'_>) -> Result<LaunchOutcome>
where
    L: ProcessLauncher + ?Sized,
{
    let mut file = tempfile::Builder::new().prefix("ogc-runner-").tempfile()?;
    file.write_all(with_shebang(script).as_bytes())?;
    file.flush()?;

    // Closing the handle before exec avoids ETXTBSY on Linux.
    let path = file.into_temp_path();
    make_executable(&path)?;
    debug!(task = %ctx.task, script = %path.display(), "persisted inline script");

    let outcome = launcher
        .launch(ctx.request(path.to_path_buf(), Vec::new()))
        .await;

    if let Err(e) = path.close() {
        debug!(task = %ctx.task, error = %e, "failed to remove temp script");
    }
    outcome
}

/// Launch `executable` with `path` as its only argument.
pub async fn run_script_file<L>(
    launcher: &L,
    executable: &str,
    path: &Path,
    ctx: AttemptContext<'_>,
) -> Result<LaunchOutcome>
where
    L: ProcessLauncher + ?Sized,
{
    let program = resolve_executable(executable, ctx.env)?;
    if !path.exists() {
        return Err(RunnerError::LaunchError(format!(
            "script not found: {}",
            path.display()
        )));
    }
    launcher
        .launch(ctx.request(program, vec![path.display().to_string()]))
        .await
}

/// Launch the single entry-point executable with `args` appended, after
/// expanding `$VAR` references in each argument.
pub async fn run_entry_point<L>(
    launcher: &L,
    entry_point: &[String],
    args: &[String],
    ctx: AttemptContext<'_>,
) -> Result<LaunchOutcome>
where
    L: ProcessLauncher + ?Sized,
{
    let [executable] = entry_point else {
        return Err(RunnerError::ConfigError(format!(
            "runner '{}': `entry_point` must name exactly one executable (got {} elements)",
            ctx.task,
            entry_point.len()
        )));
    };

    let program = resolve_executable(executable, ctx.env)?;
    let args = args.iter().map(|a| ctx.env.substitute(a)).collect();
    launcher.launch(ctx.request(program, args)).await
}

/// Platform shell invocation for a command line.
pub fn shell_argv(command: &str) -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".into(), "/C".into(), command.into()]
    } else {
        vec!["sh".into(), "-c".into(), command.into()]
    }
}

/// Look `name` up on the snapshot's `PATH`.
pub fn resolve_executable(name: &str, env: &EnvSnapshot) -> Result<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    which::which_in(name, env.get("PATH"), cwd)
        .map_err(|_| RunnerError::LaunchError(format!("executable not found: {name}")))
}

fn with_shebang(script: &str) -> String {
    let body = script.trim_start();
    if body.starts_with("#!") {
        body.to_string()
    } else {
        format!("{DEFAULT_SHEBANG}\n{body}")
    }
}
