use std::path::PathBuf;
use thiserror::Error;

/// Typed errors for SpaceSweep operations.
/// `anyhow` wraps these at the binary edge; per-item failures inside a scan or
/// a cleanup never surface as `SweepError`, they are collected into reports.
#[derive(Debug, Error)]
pub enum SweepError {
    /// Path vanished between scan and delete
    #[error("Not found: '{}'", path.display())]
    NotFound { path: PathBuf },

    /// Permission denied accessing a path
    #[error("Permission denied: '{}'. {hint}", path.display())]
    PermissionDenied { path: PathBuf, hint: String },

    /// Size could not be determined
    #[error("Could not measure '{}'", path.display())]
    Measurement { path: PathBuf },

    /// Operator-supplied setting is malformed
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Root path to analyze is not a usable directory
    #[error("Invalid root '{}': {hint}", path.display())]
    InvalidRoot { path: PathBuf, hint: String },

    /// Root exists but cannot be read at all
    #[error("Cannot read root '{}'. {hint}", path.display())]
    RootInaccessible { path: PathBuf, hint: String },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SweepError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => SweepError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => {
                let hint = crate::common::permissions::permission_hint(&path);
                SweepError::PermissionDenied { path, hint }
            }
            _ => SweepError::Io { path, source },
        }
    }

    /// Whether this error ends the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SweepError::InvalidConfiguration { .. }
                | SweepError::InvalidRoot { .. }
                | SweepError::RootInaccessible { .. }
        )
    }
}
