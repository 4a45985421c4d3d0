//! Test doubles shared by the unit tests in this crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioBuffer, AudioFormat, LevelReading};
use crate::models::device::DeviceRecord;
use crate::models::error::SenderError;
use crate::models::state::SessionState;
use crate::traits::buffer_stage::BufferStage;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureFaultCallback, CaptureProvider};
use crate::traits::device_directory::DeviceDirectory;
use crate::traits::operator_input::{Acknowledgement, OperatorInput};
use crate::traits::status_reporter::StatusReporter;

/// Little-endian bytes for a run of `f32` samples.
pub fn f32_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[derive(Default)]
struct MockShared {
    calls: Mutex<Vec<&'static str>>,
    on_buffer: Mutex<Option<AudioBufferCallback>>,
    on_fault: Mutex<Option<CaptureFaultCallback>>,
}

/// Test-side view of a `MockCaptureProvider`, usable after the provider has
/// been moved into a pipeline.
#[derive(Clone)]
pub struct MockHandle {
    shared: Arc<MockShared>,
}

impl MockHandle {
    pub fn calls(&self) -> Vec<&'static str> {
        self.shared.calls.lock().clone()
    }

    /// Fire the registered callback, as the audio engine would. The mock
    /// keeps its callback after `stop()` to model a late delivery.
    pub fn deliver(&self, data: &[u8]) {
        self.deliver_partial(data, data.len());
    }

    pub fn deliver_partial(&self, data: &[u8], valid_bytes: usize) {
        let callback = self.shared.on_buffer.lock().clone();
        if let Some(callback) = callback {
            callback(AudioBuffer::new(data, valid_bytes));
        }
    }

    pub fn fault(&self, error: SenderError) {
        let callback = self.shared.on_fault.lock().clone();
        if let Some(callback) = callback {
            callback(error);
        }
    }
}

/// In-memory capture provider.
pub struct MockCaptureProvider {
    format: Option<AudioFormat>,
    start_buffers: Vec<Vec<u8>>,
    start_fault: Option<SenderError>,
    shared: Arc<MockShared>,
}

impl MockCaptureProvider {
    pub fn new() -> Self {
        Self {
            format: Some(AudioFormat::new(48000, 32, 2)),
            start_buffers: Vec::new(),
            start_fault: None,
            shared: Arc::new(MockShared::default()),
        }
    }

    /// A provider whose `open()` fails with `DeviceUnavailable`.
    pub fn unavailable() -> Self {
        Self {
            format: None,
            ..Self::new()
        }
    }

    /// Buffers delivered synchronously from inside `start()`.
    pub fn with_start_buffers(mut self, buffers: Vec<Vec<u8>>) -> Self {
        self.start_buffers = buffers;
        self
    }

    /// Fault reported synchronously from inside `start()`.
    pub fn with_start_fault(mut self, error: SenderError) -> Self {
        self.start_fault = Some(error);
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl CaptureProvider for MockCaptureProvider {
    fn open(&mut self) -> Result<AudioFormat, SenderError> {
        self.shared.calls.lock().push("open");
        self.format
            .ok_or_else(|| SenderError::DeviceUnavailable("no default output device".into()))
    }

    fn start(
        &mut self,
        on_buffer: AudioBufferCallback,
        on_fault: CaptureFaultCallback,
    ) -> Result<(), SenderError> {
        self.shared.calls.lock().push("start");
        *self.shared.on_buffer.lock() = Some(Arc::clone(&on_buffer));
        *self.shared.on_fault.lock() = Some(Arc::clone(&on_fault));

        for buffer in &self.start_buffers {
            on_buffer(AudioBuffer::full(buffer));
        }
        if let Some(error) = self.start_fault.clone() {
            on_fault(error);
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SenderError> {
        self.shared.calls.lock().push("stop");
        Ok(())
    }

    fn close(&mut self) -> Result<(), SenderError> {
        self.shared.calls.lock().push("close");
        Ok(())
    }

    fn device_name(&self) -> Option<String> {
        Some("Mock Speakers".into())
    }
}

/// Stage that counts buffers, optionally failing on each.
#[derive(Default)]
pub struct CountingStage {
    count: AtomicU64,
    fail: bool,
}

impl CountingStage {
    pub fn failing() -> Self {
        Self {
            count: AtomicU64::new(0),
            fail: true,
        }
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

impl BufferStage for CountingStage {
    fn name(&self) -> &str {
        "counting"
    }

    fn process(&self, _buffer: &AudioBuffer<'_>, _format: &AudioFormat) -> Result<(), SenderError> {
        if self.fail {
            return Err(SenderError::CaptureFault("stage rejected buffer".into()));
        }
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Everything a `StatusReporter` was told, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    State(SessionState),
    DiscoveryStarted(String),
    Devices(Vec<String>),
    AcknowledgementRequired,
    CaptureStarted(AudioFormat),
    Error(SenderError),
}

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
    levels: Mutex<Vec<LevelReading>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    pub fn states(&self) -> Vec<SessionState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn levels(&self) -> Vec<LevelReading> {
        self.levels.lock().clone()
    }
}

impl StatusReporter for RecordingReporter {
    fn on_state_changed(&self, state: SessionState) {
        self.events.lock().push(ReportEvent::State(state));
    }

    fn on_discovery_started(&self, service_type: &str) {
        self.events
            .lock()
            .push(ReportEvent::DiscoveryStarted(service_type.to_string()));
    }

    fn on_devices_found(&self, devices: &[DeviceRecord]) {
        self.events.lock().push(ReportEvent::Devices(
            devices.iter().map(|d| d.to_string()).collect(),
        ));
    }

    fn on_acknowledgement_required(&self) {
        self.events.lock().push(ReportEvent::AcknowledgementRequired);
    }

    fn on_capture_started(&self, format: &AudioFormat, _device_name: Option<&str>) {
        self.events.lock().push(ReportEvent::CaptureStarted(*format));
    }

    fn show_level(&self, reading: LevelReading) {
        self.levels.lock().push(reading);
    }

    fn on_error(&self, error: &SenderError) {
        self.events.lock().push(ReportEvent::Error(error.clone()));
    }
}

/// Directory returning a fixed answer and remembering the query.
pub struct MockDirectory {
    result: Result<Vec<DeviceRecord>, SenderError>,
    queries: Mutex<Vec<(String, Duration)>>,
}

impl MockDirectory {
    pub fn with_devices(devices: Vec<DeviceRecord>) -> Self {
        Self {
            result: Ok(devices),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: SenderError) -> Self {
        Self {
            result: Err(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, Duration)> {
        self.queries.lock().clone()
    }
}

impl DeviceDirectory for &MockDirectory {
    fn discover(
        &self,
        service_type: &str,
        timeout: Duration,
    ) -> Result<Vec<DeviceRecord>, SenderError> {
        self.queries.lock().push((service_type.to_string(), timeout));
        self.result.clone()
    }
}

/// Operator input driven by a script.
pub struct ScriptedInput {
    acknowledgement: Acknowledgement,
    /// Polls answered with "no quit yet" before quitting.
    polls_before_quit: usize,
    pub acknowledgements_asked: usize,
    pub polls: usize,
    pub waits: Vec<Duration>,
}

impl ScriptedInput {
    pub fn new(acknowledgement: Acknowledgement, polls_before_quit: usize) -> Self {
        Self {
            acknowledgement,
            polls_before_quit,
            acknowledgements_asked: 0,
            polls: 0,
            waits: Vec::new(),
        }
    }
}

impl OperatorInput for ScriptedInput {
    fn acknowledge(&mut self) -> Acknowledgement {
        self.acknowledgements_asked += 1;
        self.acknowledgement
    }

    fn quit_requested(&mut self, wait: Duration) -> bool {
        self.polls += 1;
        self.waits.push(wait);
        self.polls > self.polls_before_quit
    }
}
