/// Error type returned by pluggable collaborators (loaders, detectors,
/// embedders, renderers). `Send + Sync` so failures can cross the threaded
/// batch runner.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
