pub mod batch_store;
pub mod csv_export;
