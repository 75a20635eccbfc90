// src/workdir.rs
use std::{fs, io, path::Path, path::PathBuf};

/// Creates a fresh, uniquely named directory under `root` that survives the
/// process so the harness can pick the certificates up afterwards.
pub fn provision(root: &Path, prefix: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(root)?;
    Ok(dir.keep())
}
