use std::error::Error as StdError;
use std::fmt;

use dinox_core::DinoxError;
use thiserror::Error;

use super::checkpoint::CheckpointError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Document-store call that failed during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOp {
    Resolve,
    PathOf,
    Create,
    Remove,
}

impl fmt::Display for DocumentOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentOp::Resolve => "resolve",
            DocumentOp::PathOf => "path lookup",
            DocumentOp::Create => "create",
            DocumentOp::Remove => "remove",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid settings: {0}")]
    ConfigInvalid(String),
    #[error("fetching notes failed: {0}")]
    SyncFetchFailed(#[from] DinoxError),
    #[error("document {op} failed for {path}: {source}")]
    DocumentOperationFailed {
        op: DocumentOp,
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("a sync is already running")]
    AlreadyRunning,
}

pub(crate) fn document_err<E>(op: DocumentOp, path: &str, source: E) -> SyncError
where
    E: StdError + Send + Sync + 'static,
{
    SyncError::DocumentOperationFailed {
        op,
        path: path.to_string(),
        source: Box::new(source),
    }
}
