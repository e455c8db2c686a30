// src/engine/core.rs

//! Pure retry/timeout state machine.
//!
//! `Idle -> Running -> {Succeeded, Failed, Retrying, TimedOut}`, with
//! `Retrying -> Running` looping back.
//!
//! The controller owns the attempt counter and the deadline. It never
//! sleeps or launches anything: the caller passes `now` in, asks
//! [`RetryController::begin_attempt`] for the next attempt's timeout, runs
//! it, and feeds the outcome to [`RetryController::record`]. The async
//! shell in `engine::runtime` does the IO.
//!
//! Bounds: with `retries = n` a task makes at most `1 + n` attempts. The
//! deadline is checked when a retry is decided and again when the retry
//! starts (after back-off); an expired deadline is always a fatal timeout.

use std::time::{Duration, Instant};

use crate::engine::{AttemptState, RetryBudget, RetryPolicy};
use crate::exec::LaunchOutcome;

/// What the shell should do before an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptPlan {
    /// Launch, bounding the process by `timeout` (time left to the deadline).
    Launch { timeout: Option<Duration> },
    /// The deadline already passed; stop with this verdict.
    Abort(Verdict),
}

/// What the shell should do after an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Sleep `back_off` (if any), then begin another attempt.
    Retry { back_off: Option<Duration> },
    Finish(Verdict),
}

/// Terminal result of the attempt sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Succeeded {
        attempts: u32,
    },
    FailedSilently {
        detail: String,
        attempts: u32,
    },
    Failed {
        detail: String,
        attempts: u32,
    },
    TimedOut {
        attempts: u32,
        last_failure: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct RetryController {
    policy: RetryPolicy,
    state: AttemptState,
    deadline: Option<Instant>,
    attempts: u32,
    retries_used: u32,
    last_failure: Option<String>,
}

impl RetryController {
    /// Start a sequence at `now`; the deadline, if any, is fixed here.
    ///
    /// A timeout too large to represent as an `Instant` means no deadline.
    pub fn new(policy: RetryPolicy, now: Instant) -> Self {
        Self {
            policy,
            state: AttemptState::Idle,
            deadline: policy.timeout.and_then(|t| now.checked_add(t)),
            attempts: 0,
            retries_used: 0,
            last_failure: None,
        }
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time left before the deadline, `None` if there is no deadline.
    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    pub fn begin_attempt(&mut self, now: Instant) -> AttemptPlan {
        let timeout = match self.time_left(now) {
            Some(left) if left.is_zero() => return AttemptPlan::Abort(self.time_out()),
            other => other,
        };

        if self.attempts > 0 {
            self.retries_used += 1;
        }
        self.attempts += 1;
        self.state = AttemptState::Running;
        AttemptPlan::Launch { timeout }
    }

    pub fn record(&mut self, outcome: &LaunchOutcome, now: Instant) -> Decision {
        match outcome {
            LaunchOutcome::Success => {
                self.state = AttemptState::Succeeded;
                Decision::Finish(Verdict::Succeeded {
                    attempts: self.attempts,
                })
            }
            LaunchOutcome::TimedOut { .. } => Decision::Finish(self.time_out()),
            LaunchOutcome::Failed { .. } => {
                let detail = outcome.detail();
                self.last_failure = Some(detail.clone());
                self.after_failure(detail, now)
            }
        }
    }

    /// Mark the sequence failed for a reason outside the outcome taxonomy
    /// (the executor returned an error).
    pub fn abort(&mut self) {
        self.state = AttemptState::Failed;
    }

    fn after_failure(&mut self, detail: String, now: Instant) -> Decision {
        let attempts = self.attempts;

        if !self.policy.wait_for_success {
            self.state = AttemptState::Failed;
            let verdict = if self.policy.fail_silently {
                Verdict::FailedSilently { detail, attempts }
            } else {
                Verdict::Failed { detail, attempts }
            };
            return Decision::Finish(verdict);
        }

        if !self.has_retries_left() {
            self.state = AttemptState::Failed;
            return Decision::Finish(Verdict::Failed { detail, attempts });
        }

        if self.time_left(now).is_some_and(|left| left.is_zero()) {
            return Decision::Finish(self.time_out());
        }

        self.state = AttemptState::Retrying;
        Decision::Retry {
            back_off: self.policy.back_off.filter(|d| !d.is_zero()),
        }
    }

    fn has_retries_left(&self) -> bool {
        match self.policy.budget() {
            RetryBudget::Limited(max) => self.retries_used < max,
            RetryBudget::UntilDeadline => true,
        }
    }

    fn time_out(&mut self) -> Verdict {
        self.state = AttemptState::TimedOut;
        Verdict::TimedOut {
            attempts: self.attempts,
            last_failure: self.last_failure.clone(),
        }
    }
}
