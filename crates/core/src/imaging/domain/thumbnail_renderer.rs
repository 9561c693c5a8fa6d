use std::path::Path;

use crate::shared::error::BoxError;
use crate::shared::face_box::FaceBox;

/// Renders a small preview of a source image with its faces outlined.
///
/// Callers treat this as fire-and-forget: a failure is logged and never
/// changes the outcome of the analysis it illustrates.
pub trait ThumbnailRenderer: Send {
    fn render(&self, source: &Path, faces: &[FaceBox], dest: &Path) -> Result<(), BoxError>;
}
