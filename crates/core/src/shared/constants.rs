pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Extensions accepted when collecting images from a folder (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff", "gif", "ppm", "pnm", "pbm", "pgm",
];

/// Directory under the system temp dir that holds every batch.
pub const STORAGE_DIR_NAME: &str = "twins_uploads";
pub const BATCH_PREFIX: &str = "twins_";
pub const THUMBS_DIR: &str = "thumbs";
pub const RESULTS_JSON: &str = "results.json";
pub const RESULTS_CSV: &str = "results.csv";

pub const DEFAULT_RETENTION_HOURS: u64 = 24;

/// Longest side of a rendered thumbnail in pixels.
pub const THUMBNAIL_SIZE: u32 = 320;
