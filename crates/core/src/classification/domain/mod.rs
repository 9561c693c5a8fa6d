pub mod batch_summary;
pub mod classification_result;
pub mod distance;
pub mod group_classifier;
pub mod image_analysis;
pub mod label;
pub mod pair_classifier;
pub mod thresholds;
