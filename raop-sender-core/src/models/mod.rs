pub mod audio_models;
pub mod config;
pub mod device;
pub mod error;
pub mod state;
pub mod summary;
