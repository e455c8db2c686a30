// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{SpecFile, TaskDescriptor};
use crate::config::validate::validate_spec;
use crate::env::EnvSnapshot;
use crate::errors::Result;

/// Parse spec TOML without semantic validation.
pub fn load_from_str(contents: &str) -> Result<SpecFile> {
    let spec: SpecFile = toml::from_str(contents)?;
    Ok(spec)
}

/// Load a spec file from a given path and return the raw `SpecFile`.
///
/// This only performs TOML deserialization; it does **not** check option
/// conflicts. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<SpecFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Load a spec file and validate every task against `env`.
///
/// This is the recommended entry point: nothing should run until the whole
/// spec has passed, so a typo in the last runner is caught before the first
/// one has side effects.
pub fn load_and_validate(path: impl AsRef<Path>, env: &EnvSnapshot) -> Result<Vec<TaskDescriptor>> {
    let spec = load_from_path(path)?;
    validate_spec(spec, env)
}

/// Spec file used when `--spec` is not given.
pub fn default_spec_path() -> PathBuf {
    PathBuf::from("Runner.toml")
}
