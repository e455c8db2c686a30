#![allow(dead_code)]

use std::path::Path;

use ogc_runner::env::EnvSnapshot;

pub use ogc_runner_test_utils::init_tracing;

/// Process environment, so spawned shells can find `sh` and friends.
pub fn process_env() -> EnvSnapshot {
    EnvSnapshot::from_process()
}

pub fn write_file(path: &Path, contents: &str) {
    std::fs::write(path, contents).expect("write test file");
}

#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).expect("metadata").permissions().mode() & 0o777
}
