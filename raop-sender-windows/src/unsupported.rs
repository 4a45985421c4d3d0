//! Stand-in provider for hosts without a loopback backend.

use raop_sender_core::{
    AudioBufferCallback, AudioFormat, CaptureFaultCallback, CaptureProvider, SenderError,
};

/// Provider whose `open()` always reports `DeviceUnavailable`.
#[derive(Debug, Default)]
pub struct UnsupportedPlatformCapture;

impl UnsupportedPlatformCapture {
    pub fn default_device() -> Self {
        Self
    }
}

impl CaptureProvider for UnsupportedPlatformCapture {
    fn open(&mut self) -> Result<AudioFormat, SenderError> {
        Err(SenderError::DeviceUnavailable(format!(
            "loopback capture is not supported on {}",
            std::env::consts::OS
        )))
    }

    fn start(
        &mut self,
        _on_buffer: AudioBufferCallback,
        _on_fault: CaptureFaultCallback,
    ) -> Result<(), SenderError> {
        Err(SenderError::DeviceUnavailable("loopback capture is not open".into()))
    }

    fn stop(&mut self) -> Result<(), SenderError> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), SenderError> {
        Ok(())
    }

    fn device_name(&self) -> Option<String> {
        None
    }
}
