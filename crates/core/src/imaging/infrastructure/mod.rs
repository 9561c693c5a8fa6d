pub mod image_file_loader;
pub mod image_thumbnail_renderer;
