use crate::models::audio_models::{AudioBuffer, AudioFormat};
use crate::models::device::DeviceRecord;
use crate::models::error::SenderError;

/// A step in the per-buffer processing chain.
///
/// Stages run in order on the delivery thread. The buffer is read-only and
/// must not be retained past the call; the capture subsystem may reuse its
/// storage for the next delivery.
pub trait BufferStage: Send + Sync {
    fn name(&self) -> &str;

    fn process(&self, buffer: &AudioBuffer<'_>, format: &AudioFormat) -> Result<(), SenderError>;
}

/// Encode, encrypt and send one buffer to a receiver.
pub trait Transmitter: Send + Sync {
    fn transmit(
        &self,
        buffer: &AudioBuffer<'_>,
        format: &AudioFormat,
        destination: &DeviceRecord,
    ) -> Result<(), SenderError>;
}

/// Forwards every buffer to a single receiver through a `Transmitter`.
pub struct TransmitStage<T: Transmitter> {
    transmitter: T,
    destination: DeviceRecord,
}

impl<T: Transmitter> TransmitStage<T> {
    pub fn new(transmitter: T, destination: DeviceRecord) -> Self {
        Self {
            transmitter,
            destination,
        }
    }

    pub fn destination(&self) -> &DeviceRecord {
        &self.destination
    }
}

impl<T: Transmitter> BufferStage for TransmitStage<T> {
    fn name(&self) -> &str {
        "transmit"
    }

    fn process(&self, buffer: &AudioBuffer<'_>, format: &AudioFormat) -> Result<(), SenderError> {
        self.transmitter.transmit(buffer, format, &self.destination)
    }
}
