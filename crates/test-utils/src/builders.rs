#![allow(dead_code)]

use std::path::PathBuf;

use ogc_runner::config::{RawAssetDescriptor, RawTaskDescriptor, TaskDescriptor};
use ogc_runner::env::EnvSnapshot;
use ogc_runner::errors::Result;

/// Builder for runner descriptors, going through the real validator.
pub struct TaskDescriptorBuilder {
    raw: RawTaskDescriptor,
}

impl TaskDescriptorBuilder {
    fn named(name: &str) -> Self {
        Self {
            raw: RawTaskDescriptor {
                name: Some(name.to_string()),
                description: Some(format!("{name} step")),
                ..RawTaskDescriptor::default()
            },
        }
    }

    pub fn command(name: &str, command: &str) -> Self {
        Self::named(name).with_command(command)
    }

    pub fn script(name: &str, script: &str) -> Self {
        let mut b = Self::named(name);
        b.raw.script = Some(script.to_string());
        b
    }

    pub fn script_path(name: &str, executable: &str, path: impl Into<PathBuf>) -> Self {
        let mut b = Self::named(name);
        b.raw.executable = Some(executable.to_string());
        b.raw.script_path = Some(path.into());
        b
    }

    pub fn entry_point(name: &str, executable: &str, args: &[&str]) -> Self {
        let mut b = Self::named(name);
        b.raw.entry_point = Some(vec![executable.to_string()]);
        b.raw.args = Some(args.iter().map(|a| a.to_string()).collect());
        b
    }

    pub fn with_command(mut self, command: &str) -> Self {
        self.raw.command = Some(command.to_string());
        self
    }

    pub fn retries(mut self, n: u32) -> Self {
        self.raw.retries = Some(n);
        self
    }

    pub fn timeout(mut self, secs: u64) -> Self {
        self.raw.timeout = Some(secs);
        self
    }

    pub fn back_off(mut self, secs: u64) -> Self {
        self.raw.back_off = Some(secs);
        self
    }

    /// `wait_for_success = true` with an immediate retry.
    pub fn wait_for_success(mut self) -> Self {
        self.raw.wait_for_success = true;
        self.raw.back_off.get_or_insert(0);
        self
    }

    pub fn fail_silently(mut self) -> Self {
        self.raw.fail_silently = true;
        self
    }

    pub fn concurrent(mut self) -> Self {
        self.raw.concurrent = true;
        self
    }

    pub fn requires_env(mut self, var: &str) -> Self {
        self.raw.env_requires.push(var.to_string());
        self
    }

    pub fn asset(mut self, asset: AssetBuilder) -> Self {
        self.raw.assets.push(asset.build());
        self
    }

    /// The unvalidated descriptor, for exercising the validator directly.
    pub fn raw(self) -> RawTaskDescriptor {
        self.raw
    }

    pub fn try_build(self, env: &EnvSnapshot) -> Result<TaskDescriptor> {
        self.raw.validate(0, env)
    }

    pub fn build(self) -> TaskDescriptor {
        self.build_with_env(&EnvSnapshot::empty())
    }

    pub fn build_with_env(self, env: &EnvSnapshot) -> TaskDescriptor {
        self.try_build(env)
            .expect("Failed to build valid runner from builder")
    }
}

/// Builder for `[[Runner.assets]]` entries.
pub struct AssetBuilder {
    asset: RawAssetDescriptor,
}

impl AssetBuilder {
    pub fn blob(name: &str, text: &str, destination: impl Into<PathBuf>) -> Self {
        Self {
            asset: RawAssetDescriptor {
                name: Some(name.to_string()),
                source_blob: Some(text.to_string()),
                destination: Some(destination.into()),
                ..RawAssetDescriptor::default()
            },
        }
    }

    pub fn file(name: &str, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            asset: RawAssetDescriptor {
                name: Some(name.to_string()),
                source_file: Some(source.into()),
                destination: Some(destination.into()),
                ..RawAssetDescriptor::default()
            },
        }
    }

    pub fn executable(mut self) -> Self {
        self.asset.is_executable = true;
        self
    }

    pub fn build(self) -> RawAssetDescriptor {
        self.asset
    }
}
