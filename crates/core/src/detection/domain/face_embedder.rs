use crate::shared::embedding::Embedding;
use crate::shared::error::BoxError;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for turning detected faces into feature vectors.
///
/// Must return exactly one embedding per input face, in the same order.
/// Callers treat any other length as a defect.
pub trait FaceEmbedder: Send {
    fn embed(&mut self, frame: &Frame, faces: &[FaceBox]) -> Result<Vec<Embedding>, BoxError>;
}
