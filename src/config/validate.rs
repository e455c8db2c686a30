// src/config/validate.rs

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::model::{
    AssetDescriptor, AssetSource, ExecutionMode, RawAssetDescriptor, RawTaskDescriptor,
    SpecFile, TaskDescriptor,
};
use crate::engine::RetryPolicy;
use crate::env::EnvSnapshot;
use crate::errors::{Result, RunnerError};

impl RawTaskDescriptor {
    /// Check conflicts and convert into a [`TaskDescriptor`].
    pub fn validate(self, index: usize, env: &EnvSnapshot) -> Result<TaskDescriptor> {
        check_conflicts(&self, index, env)?;
        into_descriptor(self, index)
    }
}

/// Validate every task in the spec.
///
/// Problems from all tasks are collected so one run of the validator shows
/// everything that needs fixing.
pub fn validate_spec(spec: SpecFile, env: &EnvSnapshot) -> Result<Vec<TaskDescriptor>> {
    if spec.runner.is_empty() {
        return Err(RunnerError::ConfigError(
            "spec must contain at least one [[Runner]] section".to_string(),
        ));
    }

    let mut tasks = Vec::with_capacity(spec.runner.len());
    let mut problems = Vec::new();

    for (index, raw) in spec.runner.into_iter().enumerate() {
        match raw.validate(index, env) {
            Ok(task) => tasks.push(task),
            Err(RunnerError::ConfigError(msg)) => problems.push(msg),
            Err(other) => return Err(other),
        }
    }

    if !problems.is_empty() {
        return Err(RunnerError::ConfigError(problems.join("\n")));
    }
    Ok(tasks)
}

/// Run the "conflict" checks for one task without converting it.
///
/// Reads only the names in `env`; no files are touched and nothing is
/// launched.
pub fn check_conflicts(raw: &RawTaskDescriptor, index: usize, env: &EnvSnapshot) -> Result<()> {
    let violations = conflicts(raw, env);
    if violations.is_empty() {
        return Ok(());
    }

    let label = raw.label(index);
    let msg = violations
        .iter()
        .map(|v| format!("runner '{label}': {v}"))
        .collect::<Vec<_>>()
        .join("\n");
    Err(RunnerError::ConfigError(msg))
}

fn conflicts(raw: &RawTaskDescriptor, env: &EnvSnapshot) -> Vec<String> {
    let mut violations = Vec::new();

    let modes: Vec<&str> = [
        ("command", raw.command.is_some()),
        ("script", raw.script.is_some()),
        ("script_path", raw.script_path.is_some()),
        ("entry_point", raw.entry_point.is_some()),
    ]
    .into_iter()
    .filter_map(|(key, set)| set.then_some(key))
    .collect();

    match modes.len() {
        0 => violations.push(
            "must have one of `command`, `script`, `script_path` or `entry_point` defined"
                .to_string(),
        ),
        1 => {}
        _ => violations.push(format!(
            "can only have one of `command`, `script`, `script_path` or `entry_point` (found {})",
            modes
                .iter()
                .map(|m| format!("`{m}`"))
                .collect::<Vec<_>>()
                .join(", ")
        )),
    }

    if raw.retries.is_some() && raw.timeout.is_some() {
        violations.push("can only have `retries` OR a `timeout` defined, not both".to_string());
    }

    if raw.timeout == Some(0) {
        violations.push("`timeout` must be at least 1 second".to_string());
    }

    if raw.wait_for_success && raw.back_off.is_none() {
        violations.push("`wait_for_success` requires `back_off` to be defined".to_string());
    }

    if raw.script_path.is_some() && raw.executable.is_none() {
        violations.push("an `executable` is required with `script_path`".to_string());
    }

    if raw.args.is_some() && raw.entry_point.is_none() {
        violations.push("`args` requires `entry_point`".to_string());
    }

    if let Some(entry_point) = &raw.entry_point {
        if entry_point.len() != 1 {
            violations.push(format!(
                "`entry_point` must name exactly one executable (got {} elements)",
                entry_point.len()
            ));
        }
    }

    if let Some(script) = &raw.script {
        if !script.trim_start().starts_with("#!") {
            violations.push(
                "missing shebang in `script`, unable to determine how to execute script"
                    .to_string(),
            );
        }
    }

    let missing = env.missing(&raw.env_requires);
    if !missing.is_empty() {
        violations.push(format!(
            "required environment variables are not set: {}",
            missing.join(", ")
        ));
    }

    for (i, asset) in raw.assets.iter().enumerate() {
        violations.extend(asset_conflicts(asset, i));
    }

    violations
}

fn asset_conflicts(asset: &RawAssetDescriptor, index: usize) -> Vec<String> {
    let mut violations = Vec::new();
    let label = asset_label(asset, index);

    match (&asset.source_blob, &asset.source_file) {
        (Some(_), Some(_)) => violations.push(format!(
            "asset '{label}' can only have one of `source_blob` or `source_file`"
        )),
        (None, None) => violations.push(format!(
            "asset '{label}' must have one of `source_blob` or `source_file`"
        )),
        _ => {}
    }

    if asset.destination.is_none() {
        violations.push(format!("asset '{label}' is missing `destination`"));
    }

    violations
}

fn asset_label(asset: &RawAssetDescriptor, index: usize) -> String {
    asset
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("#{}", index + 1))
}

fn into_descriptor(raw: RawTaskDescriptor, index: usize) -> Result<TaskDescriptor> {
    let label = raw.label(index);

    if !raw.extra.is_empty() {
        let keys: Vec<&String> = raw.extra.keys().collect();
        debug!(runner = %label, ?keys, "ignoring options not owned by the runner");
    }

    if raw.retries.is_some() && !raw.wait_for_success {
        warn!(
            runner = %label,
            "`retries` has no effect unless `wait_for_success` is enabled"
        );
    }

    let invalid = |what: &str| RunnerError::ConfigError(format!("runner '{label}': {what}"));

    let mode = if let Some(command) = raw.command {
        ExecutionMode::Command(command)
    } else if let Some(script) = raw.script {
        ExecutionMode::Script(script)
    } else if let Some(path) = raw.script_path {
        let executable = raw
            .executable
            .ok_or_else(|| invalid("an `executable` is required with `script_path`"))?;
        ExecutionMode::ScriptFile { executable, path }
    } else if let Some(entry_point) = raw.entry_point {
        ExecutionMode::EntryPoint {
            entry_point,
            args: raw.args.unwrap_or_default(),
        }
    } else {
        return Err(invalid(
            "must have one of `command`, `script`, `script_path` or `entry_point` defined",
        ));
    };

    let assets = raw
        .assets
        .into_iter()
        .enumerate()
        .map(|(i, asset)| into_asset(asset, i, &label))
        .collect::<Result<Vec<_>>>()?;

    let policy = RetryPolicy {
        wait_for_success: raw.wait_for_success,
        fail_silently: raw.fail_silently,
        retries: raw.retries,
        timeout: raw.timeout.map(Duration::from_secs),
        back_off: raw.back_off.map(Duration::from_secs),
    };

    Ok(TaskDescriptor {
        name: raw.name.unwrap_or_default(),
        description: raw.description.unwrap_or_default(),
        mode,
        concurrent: raw.concurrent,
        policy,
        env_requires: raw.env_requires,
        assets,
    })
}

fn into_asset(asset: RawAssetDescriptor, index: usize, runner: &str) -> Result<AssetDescriptor> {
    let label = asset_label(&asset, index);
    let invalid =
        |what: &str| RunnerError::ConfigError(format!("runner '{runner}': asset '{label}' {what}"));

    let source = match (asset.source_blob, asset.source_file) {
        (Some(blob), None) => AssetSource::Blob(blob),
        (None, Some(path)) => AssetSource::File(path),
        _ => return Err(invalid("must have exactly one of `source_blob` or `source_file`")),
    };
    let destination = asset
        .destination
        .ok_or_else(|| invalid("is missing `destination`"))?;

    Ok(AssetDescriptor {
        name: label.clone(),
        source,
        destination,
        is_executable: asset.is_executable,
    })
}
