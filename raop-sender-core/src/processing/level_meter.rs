//! Peak level metering for the operator readout.
//!
//! Runs on the audio delivery thread, so nothing here allocates per buffer
//! once the meter line has been created.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::models::audio_models::{AudioBuffer, AudioFormat, LevelReading};
use crate::models::error::SenderError;
use crate::traits::buffer_stage::BufferStage;
use crate::traits::status_reporter::StatusReporter;

/// Width in bytes of one `f32` sample.
pub const SAMPLE_WIDTH: usize = 4;

/// Peak magnitude of a buffer of little-endian `f32` samples.
///
/// Only the valid bytes are read. A trailing partial sample is ignored and an
/// empty buffer reads as silence. NaN samples never win the comparison.
pub fn measure(buffer: &AudioBuffer<'_>) -> LevelReading {
    let mut max = 0.0f32;
    for chunk in buffer.bytes().chunks_exact(SAMPLE_WIDTH) {
        let sample = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let magnitude = sample.abs();
        if magnitude > max {
            max = magnitude;
        }
    }
    LevelReading::clamped(max)
}

/// Number of bars to draw for `reading` on a meter `width` bars wide.
pub fn bar_count(reading: LevelReading, width: usize) -> usize {
    let bars = (reading.peak_magnitude * width as f32).round();
    (bars.max(0.0) as usize).min(width)
}

/// Single-line meter text, rewritten in place with a leading carriage return.
///
/// The backing string is sized once for the configured width and reused.
#[derive(Debug)]
pub struct MeterLine {
    width: usize,
    line: String,
}

impl MeterLine {
    const PREFIX: &'static str = "\rRecording: [";
    const SUFFIX: &'static str = "] ";

    pub fn new(width: usize) -> Self {
        Self {
            width,
            line: String::with_capacity(Self::PREFIX.len() + width + Self::SUFFIX.len()),
        }
    }

    pub fn render(&mut self, reading: LevelReading) -> &str {
        let bars = bar_count(reading, self.width);
        self.line.clear();
        self.line.push_str(Self::PREFIX);
        self.line.extend(std::iter::repeat('|').take(bars));
        self.line.extend(std::iter::repeat(' ').take(self.width - bars));
        self.line.push_str(Self::SUFFIX);
        &self.line
    }
}

/// Latest and loudest readings, shared between the delivery thread and the
/// controller. Stored as `f32` bits so neither side takes a lock.
#[derive(Debug, Default)]
pub struct LevelMonitor {
    latest: AtomicU32,
    max: AtomicU32,
}

impl LevelMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, reading: LevelReading) {
        let bits = reading.peak_magnitude.to_bits();
        self.latest.store(bits, Ordering::Relaxed);
        // Readings are clamped to [0, 1], so bit order matches numeric order.
        self.max.fetch_max(bits, Ordering::Relaxed);
    }

    pub fn latest(&self) -> LevelReading {
        LevelReading {
            peak_magnitude: f32::from_bits(self.latest.load(Ordering::Relaxed)),
        }
    }

    pub fn max(&self) -> LevelReading {
        LevelReading {
            peak_magnitude: f32::from_bits(self.max.load(Ordering::Relaxed)),
        }
    }
}

/// First stage of the processing chain: measure, remember, display.
pub struct LevelMeterStage {
    monitor: Arc<LevelMonitor>,
    reporter: Arc<dyn StatusReporter>,
}

impl LevelMeterStage {
    pub fn new(monitor: Arc<LevelMonitor>, reporter: Arc<dyn StatusReporter>) -> Self {
        Self { monitor, reporter }
    }
}

impl BufferStage for LevelMeterStage {
    fn name(&self) -> &str {
        "level-meter"
    }

    fn process(&self, buffer: &AudioBuffer<'_>, _format: &AudioFormat) -> Result<(), SenderError> {
        let reading = measure(buffer);
        self.monitor.record(reading);
        self.reporter.show_level(reading);
        Ok(())
    }
}
