//! Error types for probes and for the check as a whole.
//!
//! Probe errors are recoverable: collectors turn them into sentinel values or
//! skip the affected field. Check errors end the run and are reported once by
//! the binary.

use std::io;
use std::path::Path;
use std::time::Duration;

/// Reason a single host read could not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not supported on this platform")]
    Unsupported,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("command failed: {0}")]
    Command(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    /// Classifies an I/O error raised while reading `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        let shown = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => ProbeError::NotFound(shown),
            io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied(shown),
            _ => ProbeError::Io {
                path: shown,
                source: err,
            },
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ProbeError::PermissionDenied(_))
    }
}

/// Conditions that stop the check before a report can be produced.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// The system metrics provider has no backend for this platform.
    #[error("system metrics provider unavailable on {0}")]
    MissingProvider(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}
