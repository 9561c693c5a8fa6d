use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classification::domain::classification_result::ClassificationResult;
use crate::shared::face_box::FaceBox;

/// Per-image outcome: where the faces are and how the image was classified.
///
/// Built once by the analyzer and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    path: PathBuf,
    faces: Vec<FaceBox>,
    embeddings_count: usize,
    classification: ClassificationResult,
}

impl ImageAnalysis {
    pub fn new(
        path: PathBuf,
        faces: Vec<FaceBox>,
        embeddings_count: usize,
        classification: ClassificationResult,
    ) -> Self {
        Self {
            path,
            faces,
            embeddings_count,
            classification,
        }
    }

    /// Absolute path of the analyzed image.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn faces(&self) -> &[FaceBox] {
        &self.faces
    }

    pub fn embeddings_count(&self) -> usize {
        self.embeddings_count
    }

    pub fn classification(&self) -> &ClassificationResult {
        &self.classification
    }
}
