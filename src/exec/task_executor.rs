// src/exec/task_executor.rs

//! Maps a validated runner onto one launcher operation.

use std::time::Duration;

use crate::config::model::{ExecutionMode, TaskDescriptor};
use crate::env::EnvSnapshot;
use crate::errors::Result;
use crate::exec::command::{
    run_command, run_entry_point, run_script, run_script_file, shell_argv, AttemptContext,
};
use crate::exec::launcher::{LaunchOutcome, ProcessLauncher};

/// Runs one attempt of a task. Holds no retry state; every call is a fresh
/// process.
#[derive(Debug, Clone)]
pub struct TaskExecutor<L> {
    launcher: L,
}

impl<L: ProcessLauncher> TaskExecutor<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    pub async fn execute(
        &self,
        task: &TaskDescriptor,
        env: &EnvSnapshot,
        timeout: Option<Duration>,
        detached: bool,
    ) -> Result<LaunchOutcome> {
        let label = task.label();
        let ctx = AttemptContext {
            task: &label,
            env,
            timeout,
            detached,
        };

        match &task.mode {
            ExecutionMode::Command(command) => {
                run_command(&self.launcher, &shell_argv(command), ctx).await
            }
            ExecutionMode::Script(script) => run_script(&self.launcher, script, ctx).await,
            ExecutionMode::ScriptFile { executable, path } => {
                run_script_file(&self.launcher, executable, path, ctx).await
            }
            ExecutionMode::EntryPoint { entry_point, args } => {
                run_entry_point(&self.launcher, entry_point, args, ctx).await
            }
        }
    }
}
