use std::path::Path;

use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Decodes an image file into an RGB [`Frame`].
pub trait ImageLoader: Send {
    fn load(&self, path: &Path) -> Result<Frame, BoxError>;
}
