use serde::{Deserialize, Serialize};

/// Native format of the loopback stream.
///
/// Read once from the device when the capture pipeline is opened and never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate_hz: u32,
    pub bits_per_sample: u16,
    pub channel_count: u16,
}

impl AudioFormat {
    pub fn new(sample_rate_hz: u32, bits_per_sample: u16, channel_count: u16) -> Self {
        Self {
            sample_rate_hz,
            bits_per_sample,
            channel_count,
        }
    }

    /// Bytes in one interleaved frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> usize {
        (self.bits_per_sample as usize / 8) * self.channel_count as usize
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz, {}bit, {}ch",
            self.sample_rate_hz, self.bits_per_sample, self.channel_count
        )
    }
}

/// One delivery from the capture subsystem.
///
/// A borrowed view: it lives only for the duration of the callback, and the
/// producer may reuse `data` for the next delivery.
#[derive(Debug, Clone, Copy)]
pub struct AudioBuffer<'a> {
    data: &'a [u8],
    valid_bytes: usize,
}

impl<'a> AudioBuffer<'a> {
    /// Wrap `data`, of which the first `valid_bytes` hold audio.
    ///
    /// `valid_bytes` is clamped to the slice length.
    pub fn new(data: &'a [u8], valid_bytes: usize) -> Self {
        Self {
            data,
            valid_bytes: valid_bytes.min(data.len()),
        }
    }

    /// A buffer whose whole slice is valid.
    pub fn full(data: &'a [u8]) -> Self {
        Self::new(data, data.len())
    }

    pub fn valid_bytes(&self) -> usize {
        self.valid_bytes
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_bytes == 0
    }

    /// The valid portion of the buffer.
    pub fn bytes(&self) -> &'a [u8] {
        &self.data[..self.valid_bytes]
    }
}

/// Peak level derived from one buffer, in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LevelReading {
    pub peak_magnitude: f32,
}

impl LevelReading {
    pub const SILENT: LevelReading = LevelReading { peak_magnitude: 0.0 };

    /// Build a reading, clamping into `[0.0, 1.0]`. NaN and negative zero
    /// map to silence.
    pub fn clamped(peak: f32) -> Self {
        let peak_magnitude = if peak.is_nan() || peak <= 0.0 { 0.0 } else { peak.min(1.0) };
        Self { peak_magnitude }
    }
}

/// Counters for debugging a capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineDiagnostics {
    pub buffers_delivered: u64,
    pub empty_buffers: u64,
    pub buffers_dropped_after_stop: u64,
    pub bytes_delivered: u64,
}
