use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::storage::domain::storage_error::StorageError;

/// Opaque batch identifier; doubles as the batch directory name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

impl BatchId {
    /// Validates an externally supplied id so it can never escape the
    /// storage root.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let valid = !raw.is_empty()
            && raw != "."
            && raw != ".."
            && !raw.contains(['/', '\\', '\0']);
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(StorageError::InvalidBatchId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BatchId {
    type Error = StorageError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.0
    }
}

/// One processing run with its own working directory.
///
/// The directory is owned exclusively by this batch; it holds the ingested
/// sources, `thumbs/`, and the persisted `results.json` / `results.csv`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    id: BatchId,
    dir: PathBuf,
    created_at: SystemTime,
}

impl Batch {
    pub fn new(id: BatchId, dir: PathBuf, created_at: SystemTime) -> Self {
        Self {
            id,
            dir,
            created_at,
        }
    }

    pub fn id(&self) -> &BatchId {
        &self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}
