//! # raop-sender-core
//!
//! Platform-agnostic core of the RAOP loopback sender.
//!
//! Discovers AirPlay receivers, captures whatever the host is playing and
//! meters it, with a slot for a future encode → encrypt → send stage.
//! Platform backends (Windows WASAPI) implement the `CaptureProvider` trait
//! and plug into the generic `CapturePipeline`.
//!
//! ## Architecture
//!
//! ```text
//! raop-sender-core (this crate)
//! ├── traits/       ← CaptureProvider, DeviceDirectory, BufferStage, StatusReporter, OperatorInput
//! ├── models/       ← SenderError, SessionState, AudioFormat, AudioBuffer, DeviceRecord, etc.
//! ├── processing/   ← level meter
//! ├── pipeline/     ← CapturePipeline (delivery gate + stage chain)
//! ├── session/      ← SessionController (discovery → capture → teardown)
//! └── discovery/    ← MdnsDirectory
//! ```

pub mod discovery;
pub mod models;
pub mod pipeline;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use discovery::mdns::MdnsDirectory;
pub use models::audio_models::{AudioBuffer, AudioFormat, LevelReading, PipelineDiagnostics};
pub use models::config::{SessionConfiguration, RAOP_SERVICE_TYPE};
pub use models::device::DeviceRecord;
pub use models::error::SenderError;
pub use models::state::SessionState;
pub use models::summary::{SessionOutcome, SessionSummary};
pub use pipeline::capture_pipeline::CapturePipeline;
pub use processing::level_meter::{LevelMeterStage, LevelMonitor, MeterLine};
pub use session::controller::SessionController;
pub use traits::buffer_stage::{BufferStage, TransmitStage, Transmitter};
pub use traits::capture_provider::{AudioBufferCallback, CaptureFaultCallback, CaptureProvider};
pub use traits::device_directory::DeviceDirectory;
pub use traits::operator_input::{Acknowledgement, OperatorInput};
pub use traits::status_reporter::StatusReporter;
