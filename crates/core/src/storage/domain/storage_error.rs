use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("invalid batch id: {0:?}")]
    InvalidBatchId(String),
    #[error("batch not found: {0}")]
    BatchNotFound(String),
    #[error("a file named {0} already exists in the batch")]
    DuplicateSource(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StorageError {
        let path = path.into();
        move |source| StorageError::Io { path, source }
    }
}
