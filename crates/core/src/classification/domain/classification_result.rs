use serde::{Deserialize, Serialize};

use crate::classification::domain::label::ClassificationLabel;

/// Group-level metrics, only populated when more than two faces were compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faces_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_pair_distance: Option<f64>,
}

impl ClassificationDetail {
    pub fn is_empty(&self) -> bool {
        self.faces_count.is_none() && self.min_pair_distance.is_none()
    }
}

/// Outcome of classifying one image's embeddings.
///
/// `distance` is `Some` exactly when `label` is distance-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: ClassificationLabel,
    pub distance: Option<f64>,
    #[serde(default)]
    pub detail: ClassificationDetail,
}

impl ClassificationResult {
    pub fn no_face() -> Self {
        Self::without_distance(ClassificationLabel::NoFace)
    }

    pub fn single_person() -> Self {
        Self::without_distance(ClassificationLabel::SinglePerson)
    }

    fn without_distance(label: ClassificationLabel) -> Self {
        Self {
            label,
            distance: None,
            detail: ClassificationDetail::default(),
        }
    }
}
