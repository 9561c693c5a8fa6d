use std::path::Path;

use image::{Rgb, RgbImage};

use crate::imaging::domain::thumbnail_renderer::ThumbnailRenderer;
use crate::shared::constants::THUMBNAIL_SIZE;
use crate::shared::error::BoxError;
use crate::shared::face_box::FaceBox;

const OUTLINE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const OUTLINE_WIDTH: i32 = 2;

/// Downscales to fit `max_side` (never upscales) and outlines each face.
pub struct ImageThumbnailRenderer {
    max_side: u32,
}

impl ImageThumbnailRenderer {
    pub fn new(max_side: u32) -> Self {
        Self {
            max_side: max_side.max(1),
        }
    }
}

impl Default for ImageThumbnailRenderer {
    fn default() -> Self {
        Self::new(THUMBNAIL_SIZE)
    }
}

impl ThumbnailRenderer for ImageThumbnailRenderer {
    fn render(&self, source: &Path, faces: &[FaceBox], dest: &Path) -> Result<(), BoxError> {
        let img = image::open(source)?.to_rgb8();
        let (w, h) = img.dimensions();
        let scale = (self.max_side as f64 / w.max(1) as f64)
            .min(self.max_side as f64 / h.max(1) as f64)
            .min(1.0);

        let mut thumb = if scale < 1.0 {
            let tw = ((w as f64 * scale).round() as u32).max(1);
            let th = ((h as f64 * scale).round() as u32).max(1);
            image::imageops::resize(&img, tw, th, image::imageops::FilterType::Triangle)
        } else {
            img
        };

        for face in faces {
            draw_outline(&mut thumb, &face.scaled(scale));
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        thumb.save(dest)?;
        Ok(())
    }
}

/// Draws a rectangle outline, clipped to the image.
fn draw_outline(img: &mut RgbImage, face: &FaceBox) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let mut put = |x: i32, y: i32| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            img.put_pixel(x as u32, y as u32, OUTLINE_COLOR);
        }
    };

    for t in 0..OUTLINE_WIDTH {
        for x in face.left..=face.right {
            put(x, face.top + t);
            put(x, face.bottom - t);
        }
        for y in face.top..=face.bottom {
            put(face.left + t, y);
            put(face.right - t, y);
        }
    }
}
