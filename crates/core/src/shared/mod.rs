pub mod config;
pub mod constants;
pub mod embedding;
pub mod error;
pub mod face_box;
pub mod frame;
pub mod model_resolver;
