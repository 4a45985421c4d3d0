pub mod capture_pipeline;
