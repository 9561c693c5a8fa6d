pub mod threaded_batch_runner;
