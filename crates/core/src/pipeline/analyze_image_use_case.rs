use std::path::{Path, PathBuf};

use crate::classification::domain::group_classifier::GroupClassifier;
use crate::classification::domain::image_analysis::ImageAnalysis;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::imaging::domain::image_loader::ImageLoader;
use crate::pipeline::image_analyzer::{AnalysisError, ImageAnalyzer};

/// Single-image analysis: resolve → load → detect → embed → classify.
pub struct AnalyzeImageUseCase {
    loader: Box<dyn ImageLoader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    classifier: GroupClassifier,
}

impl AnalyzeImageUseCase {
    pub fn new(
        loader: Box<dyn ImageLoader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        classifier: GroupClassifier,
    ) -> Self {
        Self {
            loader,
            detector,
            embedder,
            classifier,
        }
    }

    pub fn execute(&mut self, path: &Path) -> Result<ImageAnalysis, AnalysisError> {
        let path = absolutize(path)?;
        if !path.is_file() {
            return Err(AnalysisError::SourceNotFound(path));
        }

        // An undecodable file never reaches the detector, so it counts as a
        // detection failure.
        let frame = match self.loader.load(&path) {
            Ok(frame) => frame,
            Err(source) => return Err(AnalysisError::DetectionFailure { path, source }),
        };
        let faces = match self.detector.detect(&frame) {
            Ok(faces) => faces,
            Err(source) => return Err(AnalysisError::DetectionFailure { path, source }),
        };

        let embeddings = if faces.is_empty() {
            Vec::new()
        } else {
            match self.embedder.embed(&frame, &faces) {
                Ok(embeddings) => embeddings,
                Err(source) => return Err(AnalysisError::EmbeddingFailure { path, source }),
            }
        };
        if embeddings.len() != faces.len() {
            return Err(AnalysisError::EmbeddingCountMismatch {
                path,
                faces: faces.len(),
                embeddings: embeddings.len(),
            });
        }

        let classification = match self.classifier.classify(&embeddings) {
            Ok(classification) => classification,
            Err(source) => return Err(AnalysisError::Classify { path, source }),
        };
        log::debug!(
            "{}: {} face(s) -> {}",
            path.display(),
            faces.len(),
            classification.label
        );

        Ok(ImageAnalysis::new(
            path,
            faces,
            embeddings.len(),
            classification,
        ))
    }
}

impl ImageAnalyzer for AnalyzeImageUseCase {
    fn analyze(&mut self, path: &Path) -> Result<ImageAnalysis, AnalysisError> {
        self.execute(path)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, AnalysisError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|_| AnalysisError::SourceNotFound(path.to_path_buf()))
}
