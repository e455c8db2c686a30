// src/lib.rs

pub mod assets;
pub mod cli;
pub mod config;
pub mod engine;
pub mod env;
pub mod errors;
pub mod exec;
pub mod logging;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::model::{AssetSource, ExecutionMode, TaskDescriptor};
use crate::config::options::FRIENDLY_NAME;
use crate::config::{load_and_validate, SUPPORTED_OPTIONS};
use crate::engine::run_pipeline;
use crate::env::EnvSnapshot;
use crate::exec::{TaskExecutor, TokioLauncher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - environment snapshot
/// - spec loading + validation
/// - the retry engine over the real process launcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    if args.list_options {
        print_options();
        return Ok(());
    }

    let env = EnvSnapshot::from_process();
    let spec_path = args.spec;
    let tasks = load_and_validate(&spec_path, &env)?;
    let tasks = select_tasks(tasks, args.task.as_deref())?;

    if args.dry_run {
        print_dry_run(&tasks);
        return Ok(());
    }

    info!(spec = %spec_path.display(), runners = tasks.len(), "starting runners");
    let executor = TaskExecutor::new(TokioLauncher::new());

    // Dropping the pipeline future drops the running child, which kills it.
    tokio::select! {
        report = run_pipeline(&tasks, &executor, &env) => {
            let report = report?;
            if !report.failed_silently.is_empty() {
                warn!(runners = ?report.failed_silently, "some runners failed silently");
            }
            Ok(())
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            warn!("interrupted, stopping the active runner");
            bail!("interrupted");
        }
    }
}

/// Keep only runners named `name`, or all of them when no filter is given.
fn select_tasks(tasks: Vec<TaskDescriptor>, name: Option<&str>) -> Result<Vec<TaskDescriptor>> {
    let Some(name) = name else {
        return Ok(tasks);
    };

    let selected: Vec<_> = tasks.into_iter().filter(|t| t.name == name).collect();
    if selected.is_empty() {
        bail!("no runner named '{name}' in the spec");
    }
    Ok(selected)
}

fn print_options() {
    println!("{FRIENDLY_NAME} options:");
    for opt in SUPPORTED_OPTIONS {
        let required = if opt.required { " (required)" } else { "" };
        match opt.default {
            Some(default) => println!("  {}{required} [default: {default}]", opt.key),
            None => println!("  {}{required}", opt.key),
        }
        println!("      {}", opt.description);
    }
}

/// Simple dry-run output: print runners, modes and retry knobs.
fn print_dry_run(tasks: &[TaskDescriptor]) {
    println!("ogc-runner dry-run");
    println!();

    println!("runners ({}):", tasks.len());
    for task in tasks {
        println!("  - {}", task.label());
        match &task.mode {
            ExecutionMode::Command(cmd) => println!("      command: {cmd}"),
            ExecutionMode::Script(script) => {
                println!("      script: {} line(s)", script.lines().count())
            }
            ExecutionMode::ScriptFile { executable, path } => {
                println!("      script_path: {executable} {}", path.display())
            }
            ExecutionMode::EntryPoint { entry_point, args } => {
                println!("      entry_point: {entry_point:?} args: {args:?}")
            }
        }
        if task.concurrent {
            println!("      concurrent: true");
        }
        let policy = &task.policy;
        if policy.wait_for_success {
            println!("      wait_for_success: true");
        }
        if let Some(retries) = policy.retries {
            println!("      retries: {retries}");
        }
        if let Some(timeout) = policy.timeout {
            println!("      timeout: {}s", timeout.as_secs());
        }
        if let Some(back_off) = policy.back_off {
            println!("      back_off: {}s", back_off.as_secs());
        }
        if policy.fail_silently {
            println!("      fail_silently: true");
        }
        if !task.env_requires.is_empty() {
            println!("      env_requires: {:?}", task.env_requires);
        }
        for asset in &task.assets {
            let source = match &asset.source {
                AssetSource::Blob(_) => "blob".to_string(),
                AssetSource::File(path) => path.display().to_string(),
            };
            println!(
                "      asset {}: {source} -> {}",
                asset.name,
                asset.destination.display()
            );
        }
    }

    debug!("dry-run complete (no execution)");
}
