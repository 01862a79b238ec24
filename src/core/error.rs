//! Error types
//!
//! Per-process failures never surface through these types except for signal
//! dispatch; only failing to list processes at all aborts a snapshot.

use std::path::PathBuf;

use thiserror::Error;

/// Snapshot failures
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cannot list processes in {}: {source}", root.display())]
    Enumerate {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Signal dispatch failure, classified by whether the process still exists
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no such process")]
    NoSuchProcess,
    #[error("{0}")]
    Other(String),
}

/// Settings file failures
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
