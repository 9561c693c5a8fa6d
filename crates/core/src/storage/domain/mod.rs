pub mod batch;
pub mod results_document;
pub mod storage_error;
