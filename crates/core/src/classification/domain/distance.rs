use thiserror::Error;

use crate::shared::embedding::Embedding;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("cannot compare embeddings of different dimensions ({left} vs {right})")]
    DimensionMismatch { left: usize, right: usize },
}

/// Euclidean (L2) distance between two embeddings of equal dimension.
pub fn euclidean_distance(a: &Embedding, b: &Embedding) -> Result<f64, ClassifyError> {
    if a.dim() != b.dim() {
        return Err(ClassifyError::DimensionMismatch {
            left: a.dim(),
            right: b.dim(),
        });
    }
    Ok(a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}
