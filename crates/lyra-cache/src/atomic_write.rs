//! Atomic file writes with the temp + rename pattern.

use std::path::Path;

use crate::{CacheError, CacheResult};

/// Atomically write `bytes` to `path`.
///
/// The payload lands in a sibling `.tmp` file first and is renamed into
/// place, so a failure at any point leaves a pre-existing file at `path`
/// untouched.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> CacheResult<()> {
    let temp_path = path.with_extension("tmp");

    std::fs::write(&temp_path, bytes).map_err(|source| CacheError::WriteFailed {
        path: temp_path.clone(),
        source,
    })?;

    std::fs::rename(&temp_path, path).map_err(|source| {
        // Don't leave the temp file behind on a failed rename.
        let _ = std::fs::remove_file(&temp_path);
        CacheError::WriteFailed {
            path: path.to_path_buf(),
            source,
        }
    })
}
