use std::path::Path;

use crate::shared::error::BoxError;

/// Opens an ONNX Runtime session with the platform's preferred accelerator.
///
/// Falls back to CPU when no platform provider is available.
pub fn open_session(model_path: &Path) -> Result<ort::session::Session, BoxError> {
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    ort::session::Session::builder()
        .map_err(ort_error)?
        .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
        .map_err(ort_error)?
        .with_intra_threads(intra_threads)
        .map_err(ort_error)?
        .with_execution_providers(preferred_execution_providers())
        .map_err(ort_error)?
        .commit_from_file(model_path)
        .map_err(ort_error)
}

/// Flattens an `ort` error into a thread-safe boxed error.
pub fn ort_error(e: impl std::fmt::Display) -> BoxError {
    format!("ONNX Runtime: {e}").into()
}

fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}
