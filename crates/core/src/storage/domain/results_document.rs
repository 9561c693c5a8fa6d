use serde::{Deserialize, Serialize};

use crate::classification::domain::batch_summary::BatchSummary;
use crate::classification::domain::image_analysis::ImageAnalysis;

/// Contents of a completed batch's `results.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub results: Vec<ImageAnalysis>,
    pub summary: BatchSummary,
}
