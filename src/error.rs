//! Typed failures of the staging/push core.
//!
//! Library functions return `anyhow::Result`; the variants below sit at the
//! root of the error chain so callers can `downcast_ref::<XploadError>()`.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which stage collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Tags,
    Pils,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Tags => write!(f, "tags"),
            StageKind::Pils => write!(f, "pils"),
        }
    }
}

#[derive(Debug, Error)]
pub enum XploadError {
    #[error("Found invalid {kind} stage {}. Fix or remove and try again: {reason}", .path.display())]
    CorruptStage {
        kind: StageKind,
        path: PathBuf,
        reason: String,
    },

    #[error("No writable prefix provided: {}", join_paths(.candidates))]
    NoWritablePrefix { candidates: Vec<PathBuf> },

    #[error("File not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to copy payload file to {}: digest {actual} != {expected}", .destination.display())]
    CopyIntegrityError {
        destination: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("No stage found. Use 'add' action to stage tags and/or pils")]
    NothingStaged,

    #[error("Unexpected response for {method} '{request}' {url}: {response}{reason}")]
    Remote {
        method: &'static str,
        url: String,
        request: String,
        response: String,
        reason: String,
    },

    #[error("Invalid interval [{start}, {end}): end must be greater than start")]
    InvalidInterval { start: u64, end: u64 },

    #[error("Invalid {field}: must be a non-empty string")]
    InvalidRecord { field: &'static str },

    #[error("Cannot find config file {file} in [{}]", .search_paths.join(", "))]
    ConfigNotFound {
        file: String,
        search_paths: Vec<String>,
    },

    #[error("Invalid config {}: {reason}", .path.display())]
    InvalidConfig { path: PathBuf, reason: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}

/// Typed root cause of an `anyhow::Error`, if there is one.
pub fn classify(err: &anyhow::Error) -> Option<&XploadError> {
    err.chain().find_map(|e| e.downcast_ref::<XploadError>())
}
