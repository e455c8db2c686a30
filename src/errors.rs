// src/errors.rs

//! Crate-wide error types.
//!
//! Expected process outcomes (non-zero exit, timeout) are *not* errors; they
//! are [`LaunchOutcome`](crate::exec::LaunchOutcome) values the controller
//! switches on. Everything here is either a configuration/asset/launch
//! problem or the final, structured failure of a task.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Asset error: {0}")]
    AssetError(String),

    #[error("Launch error: {0}")]
    LaunchError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a task ended in failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Asset,
    Launch,
    Timeout,
    Failed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Asset => "asset",
            FailureKind::Launch => "launch",
            FailureKind::Timeout => "timeout",
            FailureKind::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Terminal failure of one task, as reported to the pipeline.
///
/// `detail` is the captured diagnostic from the last failed attempt
/// (process error output, `Timeout Exceeded`, or a configuration message).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Running > {name} - FAILED\n{detail}")]
pub struct TaskFailure {
    pub name: String,
    pub description: String,
    pub kind: FailureKind,
    pub detail: String,
    pub attempts: u32,
}

impl TaskFailure {
    /// Classify a pre-execution or launch error into a task failure.
    pub fn from_error(name: &str, description: &str, err: RunnerError, attempts: u32) -> Self {
        let (kind, detail) = match err {
            RunnerError::ConfigError(msg) => (FailureKind::Configuration, msg),
            RunnerError::AssetError(msg) => (FailureKind::Asset, msg),
            RunnerError::LaunchError(msg) => (FailureKind::Launch, msg),
            other => (FailureKind::Launch, other.to_string()),
        };
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            detail,
            attempts,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
