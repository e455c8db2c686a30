// src/config/mod.rs

//! Spec loading and validation for the runner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Declare the recognised option schema (`options.rs`).
//! - Load a spec file from disk (`loader.rs`).
//! - Check option conflicts and build typed descriptors (`validate.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use loader::{default_spec_path, load_and_validate, load_from_path, load_from_str};
pub use model::{
    AssetDescriptor, AssetSource, ExecutionMode, RawAssetDescriptor, RawTaskDescriptor,
    SpecFile, TaskDescriptor,
};
pub use options::{OptionSpec, SUPPORTED_OPTIONS};
pub use validate::{check_conflicts, validate_spec};
