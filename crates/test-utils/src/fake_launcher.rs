use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ogc_runner::errors::{Result, RunnerError};
use ogc_runner::exec::{LaunchOutcome, LaunchRequest, ProcessLauncher};

enum Scripted {
    Outcome(LaunchOutcome),
    SpawnError(String),
}

/// A fake launcher that:
/// - records every request it receives
/// - answers with queued outcomes in order, then the fallback forever
/// - optionally takes `delay` per attempt, honouring the request timeout.
#[derive(Clone)]
pub struct ScriptedLauncher {
    queue: Arc<Mutex<VecDeque<Scripted>>>,
    fallback: LaunchOutcome,
    delay: Duration,
    requests: Arc<Mutex<Vec<LaunchRequest>>>,
}

impl ScriptedLauncher {
    /// Every attempt ends with `fallback` unless something is queued.
    pub fn always(fallback: LaunchOutcome) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn succeeding() -> Self {
        Self::always(LaunchOutcome::Success)
    }

    pub fn failing(stderr: &str) -> Self {
        Self::always(LaunchOutcome::failed(1, stderr))
    }

    pub fn then(self, outcome: LaunchOutcome) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted::Outcome(outcome));
        self
    }

    /// Queue a spawn failure (`RunnerError::LaunchError`).
    pub fn then_spawn_error(self, message: &str) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted::SpawnError(message.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ProcessLauncher for ScriptedLauncher {
    fn launch(
        &self,
        request: LaunchRequest,
    ) -> Pin<Box<dyn Future<Output = Result<LaunchOutcome>> + Send + '_>> {
        Box::pin(async move {
            let limit = request.timeout;
            self.requests.lock().unwrap().push(request);
            let next = self.queue.lock().unwrap().pop_front();

            if let Some(limit) = limit {
                if limit < self.delay {
                    tokio::time::sleep(limit).await;
                    return Ok(LaunchOutcome::TimedOut { limit });
                }
            }
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match next {
                Some(Scripted::Outcome(outcome)) => Ok(outcome),
                Some(Scripted::SpawnError(message)) => Err(RunnerError::LaunchError(message)),
                None => Ok(self.fallback.clone()),
            }
        })
    }
}
