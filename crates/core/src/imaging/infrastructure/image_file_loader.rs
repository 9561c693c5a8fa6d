use std::path::Path;

use crate::imaging::domain::image_loader::ImageLoader;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Loads any format the `image` crate can decode, converted to RGB8.
pub struct ImageFileLoader;

impl ImageFileLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<Frame, BoxError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = img.dimensions();
        Ok(Frame::from_rgb(img.into_raw(), width, height))
    }
}
