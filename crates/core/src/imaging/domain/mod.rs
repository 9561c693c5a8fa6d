pub mod image_loader;
pub mod thumbnail_renderer;
