// tests/process_launcher.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, process_env, write_file};

use std::error::Error;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use ogc_runner::engine::{run_task, TaskCompletion};
use ogc_runner::errors::FailureKind;
use ogc_runner::exec::launcher::CAPTURE_LIMIT;
use ogc_runner::exec::{LaunchOutcome, OutputStream, TaskExecutor, TokioLauncher};
use ogc_runner_test_utils::builders::TaskDescriptorBuilder;
use ogc_runner_test_utils::with_timeout;

type TestResult = Result<(), Box<dyn Error>>;

fn real_executor() -> TaskExecutor<TokioLauncher> {
    TaskExecutor::new(TokioLauncher::new())
}

#[tokio::test]
async fn zero_exit_is_success() -> TestResult {
    init_tracing();
    let task = TaskDescriptorBuilder::command("ok", "exit 0").build();
    let done = with_timeout(run_task(&task, &real_executor(), &process_env())).await?;
    assert_eq!(done, TaskCompletion::Succeeded { attempts: 1 });
    Ok(())
}

#[tokio::test]
async fn stderr_of_failed_process_is_reported() -> TestResult {
    init_tracing();
    let task = TaskDescriptorBuilder::command("loud", "echo oops >&2; exit 3").build();

    let failure = with_timeout(run_task(&task, &real_executor(), &process_env()))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Failed);
    assert_eq!(failure.detail, "oops");
    Ok(())
}

#[tokio::test]
async fn stdout_is_used_when_stderr_is_empty() -> TestResult {
    init_tracing();
    let task = TaskDescriptorBuilder::command("quiet", "echo only-stdout; exit 1").build();

    let failure = with_timeout(run_task(&task, &real_executor(), &process_env()))
        .await
        .unwrap_err();
    assert_eq!(failure.detail, "only-stdout");
    Ok(())
}

#[tokio::test]
async fn only_the_trailing_lines_are_kept() -> TestResult {
    init_tracing();
    let cmd = "i=1; while [ $i -le 250 ]; do echo \"line $i\" >&2; i=$((i+1)); done; exit 1";
    let task = TaskDescriptorBuilder::command("chatty", cmd).build();

    let failure = with_timeout(run_task(&task, &real_executor(), &process_env()))
        .await
        .unwrap_err();

    let lines: Vec<_> = failure.detail.lines().collect();
    assert_eq!(lines.len(), CAPTURE_LIMIT);
    assert_eq!(lines.first(), Some(&"line 51"));
    assert_eq!(lines.last(), Some(&"line 250"));
    Ok(())
}

#[tokio::test]
async fn detached_failure_still_reports_stderr() -> TestResult {
    init_tracing();
    let task = TaskDescriptorBuilder::command("bg fail", "echo x >&2; exit 1")
        .concurrent()
        .build();

    let failure = with_timeout(run_task(&task, &real_executor(), &process_env()))
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Failed);
    assert_eq!(failure.detail, "x");
    Ok(())
}

#[tokio::test]
async fn timeout_kills_the_process() -> TestResult {
    init_tracing();
    let task = TaskDescriptorBuilder::command("sleepy", "sleep 5")
        .timeout(1)
        .build();

    let started = Instant::now();
    let failure = with_timeout(run_task(&task, &real_executor(), &process_env()))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FailureKind::Timeout);
    assert_eq!(failure.detail, "Timeout Exceeded");
    assert!(started.elapsed() < Duration::from_secs(4), "{:?}", started.elapsed());
    Ok(())
}

#[tokio::test]
async fn inline_script_runs_with_its_interpreter() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let marker = dir.path().join("ran");
    let script = format!("\n#!/bin/sh\necho done > '{}'\n", marker.display());
    let task = TaskDescriptorBuilder::script("script", &script).build();

    with_timeout(run_task(&task, &real_executor(), &process_env())).await?;
    assert_eq!(std::fs::read_to_string(&marker)?.trim(), "done");
    Ok(())
}

#[tokio::test]
async fn script_path_runs_through_the_executable() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let script = dir.path().join("check.sh");
    write_file(&script, "echo from-file >&2\nexit 4\n");
    let task = TaskDescriptorBuilder::script_path("file", "sh", &script).build();

    let failure = with_timeout(run_task(&task, &real_executor(), &process_env()))
        .await
        .unwrap_err();
    assert_eq!(failure.detail, "from-file");
    Ok(())
}

#[tokio::test]
async fn missing_script_path_is_a_launch_failure() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let task = TaskDescriptorBuilder::script_path("nofile", "sh", dir.path().join("nope.sh")).build();

    let failure = run_task(&task, &real_executor(), &process_env())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Launch);
    assert!(failure.detail.contains("script not found"), "{}", failure.detail);
    Ok(())
}

#[tokio::test]
async fn entry_point_args_expand_env_vars() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let out = dir.path().join("out");
    let env = process_env().with_var("OGC_GREETING", "hello-runner");
    // Single quotes keep the shell from expanding it; the runner must.
    let cmd = format!("echo '$OGC_GREETING' > '{}'", out.display());
    let task = TaskDescriptorBuilder::entry_point("ep", "sh", &["-c", cmd.as_str()]).build();

    with_timeout(run_task(&task, &real_executor(), &env)).await?;
    assert_eq!(std::fs::read_to_string(&out)?.trim(), "hello-runner");
    Ok(())
}

#[tokio::test]
async fn unknown_entry_point_fails_before_spawning() -> TestResult {
    init_tracing();
    let task = TaskDescriptorBuilder::entry_point("ghost", "ogc-runner-no-such-binary", &[]).build();

    let failure = run_task(&task, &real_executor(), &process_env())
        .await
        .unwrap_err();
    assert_eq!(failure.kind, FailureKind::Launch);
    assert!(failure.detail.contains("executable not found"), "{}", failure.detail);
    Ok(())
}

#[tokio::test]
async fn child_only_sees_the_snapshot_environment() -> TestResult {
    init_tracing();
    let env = process_env().with_var("OGC_ONLY_IN_SNAPSHOT", "yes");
    let task = TaskDescriptorBuilder::command("env", "test \"$OGC_ONLY_IN_SNAPSHOT\" = yes").build();

    with_timeout(run_task(&task, &real_executor(), &env)).await?;
    Ok(())
}

#[tokio::test]
async fn attached_output_is_streamed_to_observer() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = TaskExecutor::new(TokioLauncher::with_observer(tx));
    let task = TaskDescriptorBuilder::command("talk", "echo one; echo two >&2").build();

    let outcome = with_timeout(executor.execute(&task, &process_env(), None, false)).await?;
    assert_eq!(outcome, LaunchOutcome::Success);
    drop(executor);

    let mut lines = Vec::new();
    while let Some(line) = rx.recv().await {
        lines.push((line.stream, line.text));
    }
    assert!(lines.contains(&(OutputStream::Stdout, "one".to_string())), "{lines:?}");
    assert!(lines.contains(&(OutputStream::Stderr, "two".to_string())), "{lines:?}");
    Ok(())
}

#[tokio::test]
async fn detached_output_is_not_streamed() -> TestResult {
    init_tracing();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let executor = TaskExecutor::new(TokioLauncher::with_observer(tx));
    let task = TaskDescriptorBuilder::command("bg", "echo hidden")
        .concurrent()
        .build();

    with_timeout(run_task(&task, &executor, &process_env())).await?;
    drop(executor);
    assert!(rx.recv().await.is_none());
    Ok(())
}
