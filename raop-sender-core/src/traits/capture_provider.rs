use std::sync::Arc;

use crate::models::audio_models::{AudioBuffer, AudioFormat};
use crate::models::error::SenderError;

/// Callback invoked once per buffer delivered by the audio subsystem.
///
/// The buffer is borrowed for the duration of the call only. Runs on the
/// provider's delivery thread and must return quickly.
pub type AudioBufferCallback = Arc<dyn Fn(AudioBuffer<'_>) + Send + Sync + 'static>;

/// Callback invoked when the audio subsystem fails mid-session.
pub type CaptureFaultCallback = Arc<dyn Fn(SenderError) + Send + Sync + 'static>;

/// Interface for platform-specific loopback capture sources.
///
/// Implemented by:
/// - `WasapiLoopbackCapture` (Windows)
/// - `UnsupportedPlatformCapture` (everywhere else)
pub trait CaptureProvider: Send {
    /// Bind to the default output device in loopback mode and report its
    /// native format.
    ///
    /// Fails with `DeviceUnavailable` if there is no default output device
    /// or the OS denies access.
    fn open(&mut self) -> Result<AudioFormat, SenderError>;

    /// Begin delivering buffers to `on_buffer`.
    ///
    /// The callback fires on a dedicated audio thread at the cadence of the
    /// OS audio engine. Mid-session failures go to `on_fault`.
    fn start(
        &mut self,
        on_buffer: AudioBufferCallback,
        on_fault: CaptureFaultCallback,
    ) -> Result<(), SenderError>;

    /// Halt delivery. No callback runs after this returns. Idempotent.
    fn stop(&mut self) -> Result<(), SenderError>;

    /// Release the device binding. Idempotent.
    fn close(&mut self) -> Result<(), SenderError>;

    /// Friendly name of the bound device, if known.
    fn device_name(&self) -> Option<String>;
}
