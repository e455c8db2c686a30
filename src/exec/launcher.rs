// src/exec/launcher.rs

//! Pluggable process launcher.
//!
//! Everything above this layer talks to a [`ProcessLauncher`] instead of
//! `tokio::process` directly, so tests can swap in a scripted fake while
//! production uses [`TokioLauncher`].

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::env::EnvSnapshot;
use crate::errors::{Result, RunnerError};

/// Trailing lines kept per stream for failure reports.
pub const CAPTURE_LIMIT: usize = 200;

/// How long to wait for output readers after the process has exited.
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// A fully resolved process launch.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Runner label, for log fields only.
    pub task: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Complete child environment; the parent's is not inherited.
    pub env: EnvSnapshot,
    pub timeout: Option<Duration>,
    /// Detached: no line streaming, only wait for exit.
    pub detached: bool,
}

/// Result of one process run. Non-zero exit and timeout are ordinary values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Success,
    Failed {
        exit_code: Option<i32>,
        /// Captured stderr, or stdout if stderr was empty.
        stderr: String,
    },
    TimedOut {
        limit: Duration,
    },
}

impl LaunchOutcome {
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        LaunchOutcome::Failed {
            exit_code: Some(exit_code),
            stderr: stderr.into(),
        }
    }

    /// Diagnostic text for reports.
    pub fn detail(&self) -> String {
        match self {
            LaunchOutcome::Success => String::new(),
            LaunchOutcome::Failed { exit_code, stderr } => {
                let trimmed = stderr.trim();
                if !trimmed.is_empty() {
                    trimmed.to_string()
                } else {
                    match exit_code {
                        Some(code) => format!("exited with status {code}"),
                        None => "terminated by signal".to_string(),
                    }
                }
            }
            LaunchOutcome::TimedOut { .. } => "Timeout Exceeded".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// One line of child output, as forwarded to an observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub task: String,
    pub stream: OutputStream,
    pub text: String,
}

/// Trait abstracting how a resolved command is actually run.
pub trait ProcessLauncher: Send + Sync {
    /// Run the request to completion (or timeout).
    ///
    /// `Err` means the process could not be started at all.
    fn launch(
        &self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>>;
}

/// Production launcher on `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct TokioLauncher {
    observer: Option<mpsc::UnboundedSender<OutputLine>>,
}

impl TokioLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also forward every attached-mode output line to `observer`.
    pub fn with_observer(observer: mpsc::UnboundedSender<OutputLine>) -> Self {
        Self {
            observer: Some(observer),
        }
    }
}

impl ProcessLauncher for TokioLauncher {
    fn launch(
        &self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>> {
        let observer = self.observer.clone();
        Box::pin(async move { launch_process(request, observer).await })
    }
}

async fn launch_process(
    request: LaunchRequest,
    observer: Option<mpsc::UnboundedSender<OutputLine>>,
) -> Result<LaunchOutcome> {
    info!(
        task = %request.task,
        program = %request.program.display(),
        args = ?request.args,
        detached = request.detached,
        timeout = ?request.timeout,
        "starting process"
    );

    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args)
        .env_clear()
        .envs(request.env.iter())
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if request.detached {
        cmd.stdout(Stdio::null());
    } else {
        cmd.stdout(Stdio::piped());
    }

    let mut child = cmd.spawn().map_err(|e| {
        RunnerError::LaunchError(format!(
            "spawning '{}' for runner '{}': {e}",
            request.program.display(),
            request.task
        ))
    })?;

    // Detached children are not streamed; stderr is still kept for reports.
    let stream_lines = !request.detached;
    let stdout = child.stdout.take().map(|out| {
        spawn_capture(
            request.task.clone(),
            OutputStream::Stdout,
            out,
            stream_lines,
            observer.clone(),
        )
    });
    let stderr = child.stderr.take().map(|err| {
        spawn_capture(
            request.task.clone(),
            OutputStream::Stderr,
            err,
            stream_lines,
            observer,
        )
    });

    let waited = match request.timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
        None => Some(child.wait().await),
    };

    let status = match waited {
        Some(res) => res.map_err(|e| {
            RunnerError::LaunchError(format!(
                "waiting for process of runner '{}': {e}",
                request.task
            ))
        })?,
        None => {
            let limit = request.timeout.unwrap_or_default();
            warn!(
                task = %request.task,
                limit_secs = limit.as_secs_f64(),
                "timeout exceeded; killing process"
            );
            if let Err(e) = child.kill().await {
                warn!(task = %request.task, error = %e, "failed to kill timed out process");
            }
            for handle in [stdout, stderr].into_iter().flatten() {
                handle.abort();
            }
            return Ok(LaunchOutcome::TimedOut { limit });
        }
    };

    let stdout_lines = drain(stdout).await;
    let stderr_lines = drain(stderr).await;

    let code = status.code();
    debug!(
        task = %request.task,
        exit_code = ?code,
        success = status.success(),
        "process exited"
    );

    if status.success() {
        return Ok(LaunchOutcome::Success);
    }

    let captured = if stderr_lines.is_empty() {
        stdout_lines
    } else {
        stderr_lines
    };
    Ok(LaunchOutcome::Failed {
        exit_code: code,
        stderr: captured.join("\n"),
    })
}

/// Read `reader` line by line, logging (and forwarding) when `stream_lines`
/// is set, keeping the last [`CAPTURE_LIMIT`] lines.
fn spawn_capture<R>(
    task: String,
    stream: OutputStream,
    reader: R,
    stream_lines: bool,
    observer: Option<mpsc::UnboundedSender<OutputLine>>,
) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut captured = VecDeque::with_capacity(CAPTURE_LIMIT);

        while let Ok(Some(line)) = lines.next_line().await {
            if stream_lines {
                debug!(task = %task, %stream, "{}", line);
                if let Some(tx) = &observer {
                    let _ = tx.send(OutputLine {
                        task: task.clone(),
                        stream,
                        text: line.clone(),
                    });
                }
            }
            if captured.len() == CAPTURE_LIMIT {
                captured.pop_front();
            }
            captured.push_back(line);
        }

        Vec::from(captured)
    })
}

/// Collect a reader's captured lines, giving up after a short grace period
/// (a grandchild may still hold the pipe open).
async fn drain(handle: Option<JoinHandle<Vec<String>>>) -> Vec<String> {
    let Some(mut handle) = handle else {
        return Vec::new();
    };
    match tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut handle).await {
        Ok(Ok(lines)) => lines,
        Ok(Err(e)) => {
            debug!(error = %e, "output reader task failed");
            Vec::new()
        }
        Err(_) => {
            handle.abort();
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_detail_prefers_captured_text() {
        let out = LaunchOutcome::failed(2, "  boom\n");
        assert_eq!(out.detail(), "boom");

        let silent = LaunchOutcome::failed(3, "");
        assert_eq!(silent.detail(), "exited with status 3");

        let timed = LaunchOutcome::TimedOut {
            limit: Duration::from_secs(1),
        };
        assert_eq!(timed.detail(), "Timeout Exceeded");
    }
}
