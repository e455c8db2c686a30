// src/engine/mod.rs

//! Retry/timeout engine.
//!
//! The pure state machine deciding whether an attempt outcome is final or
//! retryable lives in [`core`]; the async shell that launches attempts,
//! sleeps between them and sequences a whole pipeline is in [`runtime`].

use std::time::Duration;

/// Per-task retry and timeout knobs, as validated from the spec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Enables the retry loop at all.
    pub wait_for_success: bool,
    /// Swallow the final failure when no retry loop is in play.
    pub fail_silently: bool,
    pub retries: Option<u32>,
    /// Deadline for the whole attempt sequence, not each attempt.
    pub timeout: Option<Duration>,
    pub back_off: Option<Duration>,
}

impl RetryPolicy {
    /// How many retries the loop may make.
    pub fn budget(&self) -> RetryBudget {
        if !self.wait_for_success {
            return RetryBudget::Limited(0);
        }
        match (self.retries, self.timeout) {
            (Some(n), _) => RetryBudget::Limited(n),
            (None, Some(_)) => RetryBudget::UntilDeadline,
            (None, None) => RetryBudget::Limited(0),
        }
    }
}

/// Retry allowance after the first failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBudget {
    /// At most this many retries: `n + 1` attempts in total.
    Limited(u32),
    /// Keep retrying until the timeout deadline passes.
    UntilDeadline,
}

/// Controller state, see [`core::RetryController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Idle,
    Running,
    Retrying,
    Succeeded,
    Failed,
    TimedOut,
}

/// Non-error end of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCompletion {
    Succeeded { attempts: u32 },
    /// Failed, but `fail_silently` let the pipeline continue.
    FailedSilently { detail: String, attempts: u32 },
}

pub mod core;
pub mod runtime;

pub use self::core::{AttemptPlan, Decision, RetryController, Verdict};
pub use runtime::{run_pipeline, run_task, PipelineReport};
