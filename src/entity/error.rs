use std::path::PathBuf;

use thiserror::Error;

/// Errors from the domain layer: identifier/range parsing, graph
/// mutation rules, and install-state snapshot I/O.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("invalid package identifier `{0}`")]
    InvalidIdent(String),

    #[error("invalid version range `{0}`")]
    InvalidRange(String),

    #[error("descriptor `{0}` is not registered in the project")]
    UnknownDescriptor(String),

    #[error("refusing to alias descriptor `{0}` to itself")]
    SelfAlias(String),

    #[error("failed to read install state from {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse install state from {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write install state to {path}: {source}")]
    SnapshotWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("install state references out-of-bounds entry {0}")]
    SnapshotIndex(usize),
}
