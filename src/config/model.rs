// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::RetryPolicy;

/// Top-level spec file as read from TOML.
///
/// ```toml
/// [[Runner]]
/// name = "Waiting for Sonobuoy to complete"
/// description = "poll until done"
/// script = '''
/// #!/bin/bash
/// sonobuoy status | grep -q 'Sonobuoy has completed'
/// '''
/// wait_for_success = true
/// timeout = 10800
/// back_off = 15
///
/// [[Runner.assets]]
/// name = "pytest config"
/// source_file = "data/pytest.ini"
/// destination = "jobs/pytest.ini"
/// ```
///
/// Other top-level tables belong to other plugins and are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecFile {
    /// Tasks in declaration order, from `[[Runner]]`.
    #[serde(default, rename = "Runner", alias = "runner")]
    pub runner: Vec<RawTaskDescriptor>,
}

/// One `[[Runner]]` table exactly as written, before validation.
///
/// Mutually exclusive options are all `Option`s here so the validator can
/// see (and report) every conflict. The validated form is [`TaskDescriptor`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTaskDescriptor {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Shell command line.
    #[serde(default, alias = "cmd")]
    pub command: Option<String>,

    /// Inline script; must start with a `#!` interpreter line.
    #[serde(default, alias = "run")]
    pub script: Option<String>,

    /// Path to an existing script, run with `executable`.
    #[serde(default, alias = "run_script", alias = "run-script")]
    pub script_path: Option<PathBuf>,

    /// Interpreter for `script_path` (e.g. `python3`).
    #[serde(default)]
    pub executable: Option<String>,

    /// Single-element launch vector, e.g. `["snapcraft"]`.
    #[serde(default, alias = "entry-point")]
    pub entry_point: Option<Vec<String>>,

    /// Arguments appended to `entry_point`, with `$VAR` expansion.
    #[serde(default)]
    pub args: Option<Vec<String>>,

    /// Run detached: no line streaming, just wait for exit.
    #[serde(default)]
    pub concurrent: bool,

    /// Whole-sequence budget in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,

    #[serde(default)]
    pub retries: Option<u32>,

    #[serde(default, alias = "wait-for-success")]
    pub wait_for_success: bool,

    /// Seconds to sleep between retries.
    #[serde(default, alias = "back-off")]
    pub back_off: Option<u64>,

    #[serde(default, alias = "fail-silently")]
    pub fail_silently: bool,

    /// Environment variables that must be present before anything runs.
    #[serde(default, alias = "env-requires")]
    pub env_requires: Vec<String>,

    #[serde(default)]
    pub assets: Vec<RawAssetDescriptor>,

    /// Keys owned by the host or other plugins (`deps`, `tags`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl RawTaskDescriptor {
    /// Human label for messages, falling back to the position in the spec.
    pub fn label(&self, index: usize) -> String {
        display_name(self.name.as_deref(), self.description.as_deref())
            .unwrap_or_else(|| format!("Runner #{}", index + 1))
    }
}

/// `[[Runner.assets]]` table as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAssetDescriptor {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, alias = "source-blob")]
    pub source_blob: Option<String>,

    #[serde(default, alias = "source-file")]
    pub source_file: Option<PathBuf>,

    #[serde(default)]
    pub destination: Option<PathBuf>,

    #[serde(default, alias = "is-executable")]
    pub is_executable: bool,
}

/// A validated task, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub name: String,
    pub description: String,
    pub mode: ExecutionMode,
    pub concurrent: bool,
    pub policy: RetryPolicy,
    pub env_requires: Vec<String>,
    pub assets: Vec<AssetDescriptor>,
}

impl TaskDescriptor {
    /// Name used in logs and failure reports.
    pub fn label(&self) -> String {
        display_name(Some(&self.name), Some(&self.description))
            .unwrap_or_else(|| "unnamed runner".to_string())
    }
}

/// How the task's process is produced. Exactly one per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    Command(String),
    Script(String),
    ScriptFile {
        executable: String,
        path: PathBuf,
    },
    EntryPoint {
        entry_point: Vec<String>,
        args: Vec<String>,
    },
}

impl ExecutionMode {
    /// Option key that selected this mode.
    pub fn key(&self) -> &'static str {
        match self {
            ExecutionMode::Command(_) => "command",
            ExecutionMode::Script(_) => "script",
            ExecutionMode::ScriptFile { .. } => "script_path",
            ExecutionMode::EntryPoint { .. } => "entry_point",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDescriptor {
    pub name: String,
    pub source: AssetSource,
    pub destination: PathBuf,
    pub is_executable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Inline text written to the destination.
    Blob(String),
    /// Existing file moved to the destination.
    File(PathBuf),
}

fn display_name(name: Option<&str>, description: Option<&str>) -> Option<String> {
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        return Some(name.to_string());
    }
    description
        .and_then(|d| d.trim().lines().next())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
