use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failures while reading or writing `gallery-config.json`.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but is not a gallery manifest. Fatal for the run so
    /// that user data is never silently replaced.
    #[error("Malformed manifest {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Manifest not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures of the external media tools.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Missing required tools: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    NonZeroExit {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} reported no value")]
    Unavailable { tool: String },

    #[error("{tool} produced unparseable output: {output:?}")]
    Unparseable { tool: String, output: String },

    #[error("{tool} wrote nothing to {path}")]
    EmptyOutput { tool: String, path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-input failures of the import pipeline. These skip one input and
/// never abort a batch.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Unsupported input {path}: expected a .heic/.heif file or a paired folder")]
    UnsupportedInput { path: PathBuf },

    #[error("No still image found in {0}")]
    NoStill(PathBuf),

    #[error("Ambiguous pairing in {dir}: {count} {kind} files")]
    AmbiguousPairing {
        dir: PathBuf,
        kind: &'static str,
        count: usize,
    },

    #[error("Cannot derive an id from {0}")]
    EmptyId(PathBuf),

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Failures that end an import batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("Failed to create gallery directory {path}: {source}")]
    Layout {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T, E = ManifestError> = std::result::Result<T, E>;
