use crate::classification::domain::classification_result::{
    ClassificationDetail, ClassificationResult,
};
use crate::classification::domain::distance::{euclidean_distance, ClassifyError};
use crate::classification::domain::thresholds::Thresholds;
use crate::shared::embedding::Embedding;

/// Classifies a single pair of faces by their embedding distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairClassifier {
    thresholds: Thresholds,
}

impl PairClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn classify(&self, a: &Embedding, b: &Embedding) -> Result<ClassificationResult, ClassifyError> {
        let distance = euclidean_distance(a, b)?;
        Ok(self.classify_distance(distance))
    }

    pub fn classify_distance(&self, distance: f64) -> ClassificationResult {
        ClassificationResult {
            label: self.thresholds.label_for(distance),
            distance: Some(distance),
            detail: ClassificationDetail::default(),
        }
    }
}
