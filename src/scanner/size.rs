use std::path::Path;
use walkdir::WalkDir;

use crate::common::errors::SweepError;

/// Disk usage of a file or directory subtree, in KB (1024-byte units).
///
/// `None` when the path is missing or its own metadata can't be read. Entries
/// inside a subtree that fail mid-walk (vanished, unreadable) count as 0.
pub fn measure(path: &Path) -> Option<u64> {
    try_measure(path).ok()
}

/// Like [`measure`], but says why the path could not be measured
pub fn try_measure(path: &Path) -> Result<u64, SweepError> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "measurement failed");
        match e.kind() {
            std::io::ErrorKind::NotFound => SweepError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SweepError::Measurement {
                path: path.to_path_buf(),
            },
        }
    })?;

    let bytes = if metadata.is_dir() {
        dir_bytes(path)
    } else {
        metadata.len()
    };

    Ok(bytes_to_kb(bytes))
}

/// Apparent size of all regular files below `path`
pub fn dir_bytes(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .sum()
}

/// Number of entries (files, dirs, links) strictly below `path`
pub fn count_entries(path: &Path) -> usize {
    WalkDir::new(path)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .count()
}

/// Bytes to KB, rounding up so a non-empty file never reads as 0
pub fn bytes_to_kb(bytes: u64) -> u64 {
    bytes.div_ceil(1024)
}
