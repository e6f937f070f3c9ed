use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage write task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Storage could not replace [{path}]: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error
    }
}
