pub mod analyze_image_use_case;
pub mod batch_logger;
pub mod classify_batch_use_case;
pub mod image_analyzer;
pub mod infrastructure;
