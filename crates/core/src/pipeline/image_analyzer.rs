use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::classification::domain::distance::ClassifyError;
use crate::classification::domain::image_analysis::ImageAnalysis;
use crate::shared::error::BoxError;

/// Failure to analyze one image. Always scoped to that image; the batch
/// orchestrator turns it into an error event and moves on.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("face detection failed for {path}: {source}")]
    DetectionFailure {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("face embedding failed for {path}: {source}")]
    EmbeddingFailure {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("{path}: embedder returned {embeddings} embedding(s) for {faces} face(s)")]
    EmbeddingCountMismatch {
        path: PathBuf,
        faces: usize,
        embeddings: usize,
    },
    #[error("classification failed for {path}: {source}")]
    Classify {
        path: PathBuf,
        #[source]
        source: ClassifyError,
    },
}

/// Turns one image path into an [`ImageAnalysis`].
pub trait ImageAnalyzer: Send {
    fn analyze(&mut self, path: &Path) -> Result<ImageAnalysis, AnalysisError>;
}
