//! File-based repository implementations.
//!
//! One file per row, written to a temp file and renamed into place. File
//! stems are the hex-encoded row id so arbitrary ids stay filesystem safe.

mod session;
mod snapshot;

pub use session::FileSessionRepository;
pub use snapshot::FileSnapshotRepository;

use std::fs;
use std::path::{Path, PathBuf};

use crate::repository::{RepositoryError, Result};

fn row_path(base_dir: &Path, id: &str, extension: &str) -> PathBuf {
    base_dir.join(format!("{}.{}", hex::encode(id), extension))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RepositoryError::Io(e)),
    }
}

/// Ids of every row with `extension` under `base_dir`.
fn list_ids(base_dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    for entry in fs::read_dir(base_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let foreign = |reason: String| RepositoryError::ForeignFile {
            path: path.clone(),
            reason,
        };
        let bytes = hex::decode(stem).map_err(|e| foreign(e.to_string()))?;
        let id = String::from_utf8(bytes).map_err(|e| foreign(e.to_string()))?;
        ids.push(id);
    }
    ids.sort_unstable();
    Ok(ids)
}
