use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataFetchError {
    #[error("failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("malformed graph data in {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unknown workspace: {0}")]
    Workspace(String),
    #[error("background load worker disconnected")]
    Disconnected,
}

impl DataFetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, error: &serde_json::Error) -> Self {
        Self::Parse {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("edge {edge_id} references unknown node {node_id}")]
    DanglingEdge { edge_id: String, node_id: String },
}

/// Debug builds fail loudly; release builds log and let the caller drop the record.
pub(crate) fn report_violation(violation: &InvariantViolation) {
    debug_assert!(false, "{violation}");
    tracing::warn!(%violation, "dropping record that violates graph invariants");
}
