use crate::shared::error::BoxError;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for locating faces in a still image.
///
/// Implementations may hold inference sessions that need exclusive access,
/// hence `&mut self`. An unreadable or undecodable input is an error, never
/// an empty result.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, BoxError>;
}
