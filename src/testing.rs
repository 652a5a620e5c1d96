//! Scratch hook scripts for unit tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write an executable `/bin/sh` script into `dir` and return its path.
///
/// Callers spawn the script right away, so tests using this must be
/// `#[serial]` to keep other tests from forking while the file is open.
pub fn write_hook(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}
