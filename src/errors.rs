//! Error types for codesnap.

use std::path::PathBuf;

use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for a snapshot run.
///
/// Everything here is fatal. Per-file read problems never surface as
/// errors; they are written into the document and counted instead.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("source folder not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("source is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}
