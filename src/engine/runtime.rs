// src/engine/runtime.rs

//! Async shell around [`RetryController`].
//!
//! This owns the side effects the core only decides about: materializing
//! assets, launching attempts through the [`TaskExecutor`], and sleeping
//! between retries. Intermediate failures are only visible in the logs;
//! callers see the final outcome.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::assets::materialize_assets;
use crate::config::model::TaskDescriptor;
use crate::engine::TaskCompletion;
use crate::env::EnvSnapshot;
use crate::errors::{FailureKind, RunnerError, TaskFailure};
use crate::exec::{ProcessLauncher, TaskExecutor};

use super::core::{AttemptPlan, Decision, RetryController, Verdict};

/// Names of runners that finished, by how they finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub succeeded: Vec<String>,
    pub failed_silently: Vec<String>,
}

/// Run tasks strictly in order, stopping at the first failure.
pub async fn run_pipeline<L: ProcessLauncher>(
    tasks: &[TaskDescriptor],
    executor: &TaskExecutor<L>,
    env: &EnvSnapshot,
) -> Result<PipelineReport, TaskFailure> {
    let mut report = PipelineReport::default();

    for task in tasks {
        match run_task(task, executor, env).await? {
            TaskCompletion::Succeeded { .. } => report.succeeded.push(task.label()),
            TaskCompletion::FailedSilently { .. } => report.failed_silently.push(task.label()),
        }
    }

    info!(
        succeeded = report.succeeded.len(),
        failed_silently = report.failed_silently.len(),
        "all runners finished"
    );
    Ok(report)
}

/// Run one task: assets first, then attempts until the controller is done.
pub async fn run_task<L: ProcessLauncher>(
    task: &TaskDescriptor,
    executor: &TaskExecutor<L>,
    env: &EnvSnapshot,
) -> Result<TaskCompletion, TaskFailure> {
    let label = task.label();
    let fail = |err: RunnerError, attempts: u32| {
        TaskFailure::from_error(&label, &task.description, err, attempts)
    };

    info!(
        runner = %label,
        description = %task.description.trim(),
        mode = task.mode.key(),
        "runner started"
    );

    let missing = env.missing(&task.env_requires);
    if !missing.is_empty() {
        return Err(fail(
            RunnerError::ConfigError(format!(
                "required environment variables are not set: {}",
                missing.join(", ")
            )),
            0,
        ));
    }

    materialize_assets(&label, &task.assets).map_err(|e| fail(e, 0))?;

    let mut ctl = RetryController::new(task.policy, Instant::now());
    let verdict = loop {
        let timeout = match ctl.begin_attempt(Instant::now()) {
            AttemptPlan::Launch { timeout } => timeout,
            AttemptPlan::Abort(verdict) => break verdict,
        };
        debug!(runner = %label, attempt = ctl.attempts(), ?timeout, "starting attempt");

        let outcome = match executor.execute(task, env, timeout, task.concurrent).await {
            Ok(outcome) => outcome,
            Err(err) => {
                ctl.abort();
                return Err(fail(err, ctl.attempts()));
            }
        };

        let now = Instant::now();
        match ctl.record(&outcome, now) {
            Decision::Finish(verdict) => break verdict,
            Decision::Retry { back_off } => {
                debug!(
                    runner = %label,
                    attempt = ctl.attempts(),
                    detail = %outcome.detail(),
                    "failure detected, initiating retry"
                );
                if let Some(left) = ctl.time_left(now) {
                    debug!(runner = %label, seconds_left = left.as_secs(), "deadline approaching");
                }
                if let Some(delay) = back_off {
                    info!(runner = %label, seconds = delay.as_secs(), "sleeping before retry");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    };

    finish(verdict, &label, &task.description)
}

fn finish(
    verdict: Verdict,
    label: &str,
    description: &str,
) -> Result<TaskCompletion, TaskFailure> {
    let failure = |kind, detail: String, attempts| TaskFailure {
        name: label.to_string(),
        description: description.to_string(),
        kind,
        detail,
        attempts,
    };

    match verdict {
        Verdict::Succeeded { attempts } => {
            info!(runner = %label, attempts, "runner succeeded");
            Ok(TaskCompletion::Succeeded { attempts })
        }
        Verdict::FailedSilently { detail, attempts } => {
            error!(runner = %label, attempts, %detail, "runner failed (silently)");
            Ok(TaskCompletion::FailedSilently { detail, attempts })
        }
        Verdict::Failed { detail, attempts } => {
            warn!(runner = %label, attempts, "runner failed");
            Err(failure(FailureKind::Failed, detail, attempts))
        }
        Verdict::TimedOut {
            attempts,
            last_failure,
        } => {
            warn!(runner = %label, attempts, "runner timed out");
            let detail = match last_failure {
                Some(last) => format!("Timeout Exceeded\nlast failure: {last}"),
                None => "Timeout Exceeded".to_string(),
            };
            Err(failure(FailureKind::Timeout, detail, attempts))
        }
    }
}
