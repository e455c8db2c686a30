// src/assets.rs

//! Asset materialization: files put in place before a runner executes.
//!
//! Blobs are written to a temp file next to the destination and renamed
//! over it, so readers never observe a half-written asset. Source files are
//! *moved*, not copied.

use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::config::model::{AssetDescriptor, AssetSource};
use crate::errors::{Result, RunnerError};

/// Materialize assets in declaration order, stopping at the first failure.
pub fn materialize_assets(runner: &str, assets: &[AssetDescriptor]) -> Result<()> {
    if assets.is_empty() {
        return Ok(());
    }

    info!(runner = %runner, count = assets.len(), "building assets");
    for asset in assets {
        debug!(
            runner = %runner,
            asset = %asset.name,
            destination = %asset.destination.display(),
            executable = asset.is_executable,
            "materializing asset"
        );
        match &asset.source {
            AssetSource::Blob(text) => write_blob(text, &asset.destination, asset.is_executable)?,
            AssetSource::File(path) => relocate_file(path, &asset.destination, asset.is_executable)?,
        }
    }
    Ok(())
}

/// Write `text` to `destination`, optionally executable.
///
/// Fails if the destination's parent directory does not exist.
pub fn write_blob(text: &str, destination: &Path, is_executable: bool) -> Result<()> {
    let parent = match destination.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(RunnerError::AssetError(format!(
            "destination directory {} does not exist",
            parent.display()
        )));
    }

    let mut tmp = tempfile::Builder::new()
        .prefix(".ogc-asset-")
        .tempfile_in(parent)
        .map_err(|e| asset_io("creating temp file in", parent, e))?;
    tmp.write_all(text.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| asset_io("writing temp file for", destination, e))?;

    if is_executable {
        make_executable(tmp.path()).map_err(|e| asset_io("marking executable", tmp.path(), e))?;
    }

    tmp.persist(destination)
        .map_err(|e| asset_io("renaming asset to", destination, e.error))?;
    Ok(())
}

/// Move an existing file to `destination`, optionally marking it
/// executable first. The source path no longer exists afterwards.
pub fn relocate_file(source: &Path, destination: &Path, is_executable: bool) -> Result<()> {
    if !source.exists() {
        return Err(RunnerError::AssetError(format!(
            "asset source {} not found",
            source.display()
        )));
    }

    if is_executable {
        make_executable(source).map_err(|e| asset_io("marking executable", source, e))?;
    }

    std::fs::rename(source, destination).map_err(|e| {
        RunnerError::AssetError(format!(
            "moving {} to {}: {e}",
            source.display(),
            destination.display()
        ))
    })
}

/// Grant execute wherever read is granted (owner, group, other).
#[cfg(unix)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    let mode = perms.mode();
    perms.set_mode(mode | ((mode & 0o444) >> 2));
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

fn asset_io(action: &str, path: &Path, err: io::Error) -> RunnerError {
    RunnerError::AssetError(format!("{action} {}: {err}", path.display()))
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use super::*;

    #[test]
    fn make_executable_mirrors_read_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, "x").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        make_executable(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn blob_without_parent_dir_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.txt");
        let err = write_blob("hi", &dest, false).unwrap_err();
        assert!(matches!(err, RunnerError::AssetError(_)), "{err:?}");
    }
}
