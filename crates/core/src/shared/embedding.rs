use serde::{Deserialize, Serialize};

/// Fixed-length feature vector for one detected face.
///
/// The dimension is whatever the embedding model produces (128 for dlib,
/// 512 for ArcFace); it is constant within a run but never checked here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f64>);

impl Embedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Rescales to unit L2 norm in place. Zero vectors are left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.0.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in self.0.iter_mut() {
                *x /= norm;
            }
        }
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

impl From<&[f32]> for Embedding {
    fn from(values: &[f32]) -> Self {
        Self(values.iter().map(|v| *v as f64).collect())
    }
}
