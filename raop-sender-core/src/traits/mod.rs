pub mod buffer_stage;
pub mod capture_provider;
pub mod device_directory;
pub mod operator_input;
pub mod status_reporter;
