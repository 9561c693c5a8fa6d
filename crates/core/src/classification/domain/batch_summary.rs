use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classification::domain::image_analysis::ImageAnalysis;
use crate::classification::domain::label::ClassificationLabel;

/// Aggregate over the successfully analyzed images of one batch.
///
/// Always recomputed from the full result set; `counts` only lists labels
/// that occurred.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub counts: BTreeMap<ClassificationLabel, usize>,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_distance: Option<f64>,
}

impl BatchSummary {
    pub fn from_results(results: &[ImageAnalysis]) -> Self {
        let mut counts = BTreeMap::new();
        for analysis in results {
            *counts.entry(analysis.classification().label).or_insert(0) += 1;
        }

        let mut distances: Vec<f64> = results
            .iter()
            .filter_map(|a| a.classification().distance)
            .collect();
        distances.sort_by(f64::total_cmp);

        Self {
            counts,
            total: results.len(),
            mean_distance: mean(&distances),
            median_distance: median(&distances),
        }
    }

    pub fn count(&self, label: ClassificationLabel) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Percentage of `total` carrying `label`; 0 for an empty batch.
    pub fn share(&self, label: ClassificationLabel) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(label) as f64 / self.total as f64 * 100.0
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of sorted values; even counts average the two middle values.
fn median(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}
