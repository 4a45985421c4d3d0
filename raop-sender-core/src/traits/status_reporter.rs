use crate::models::audio_models::{AudioFormat, LevelReading};
use crate::models::device::DeviceRecord;
use crate::models::error::SenderError;
use crate::models::state::SessionState;

/// Operator-facing presentation of a session.
///
/// The core never writes to the console; everything the operator sees goes
/// through this trait. `show_level` is called from the audio delivery thread
/// and must not block. All other methods are called from the controller.
pub trait StatusReporter: Send + Sync {
    fn on_state_changed(&self, state: SessionState);

    fn on_discovery_started(&self, service_type: &str);

    /// Called with the full result of the sweep, possibly empty.
    fn on_devices_found(&self, devices: &[DeviceRecord]);

    /// Explain that no receivers were found and what the operator can do.
    fn on_acknowledgement_required(&self);

    fn on_capture_started(&self, format: &AudioFormat, device_name: Option<&str>);

    /// Rewrite the single-line meter in place.
    fn show_level(&self, reading: LevelReading);

    fn on_error(&self, error: &SenderError);
}
