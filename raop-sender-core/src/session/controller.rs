use std::sync::Arc;

use chrono::Utc;

use crate::models::config::SessionConfiguration;
use crate::models::error::SenderError;
use crate::models::state::SessionState;
use crate::models::summary::{SessionOutcome, SessionSummary};
use crate::pipeline::capture_pipeline::CapturePipeline;
use crate::processing::level_meter::{LevelMeterStage, LevelMonitor};
use crate::traits::buffer_stage::BufferStage;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::device_directory::DeviceDirectory;
use crate::traits::operator_input::{Acknowledgement, OperatorInput};
use crate::traits::status_reporter::StatusReporter;

/// Runs one sender session from discovery to teardown.
///
/// ```text
/// [DeviceDirectory] → (acknowledge if no receivers) → [CapturePipeline]
///                                                          ↓
///                        poll quit / faults every `poll_interval`
///                                                          ↓
///                                              stop() → close()
/// ```
/// Teardown runs on every exit path, including discovery and device
/// failures, so the audio device is always released.
pub struct SessionController<D, P, I>
where
    D: DeviceDirectory,
    P: CaptureProvider,
    I: OperatorInput,
{
    config: SessionConfiguration,
    directory: D,
    pipeline: CapturePipeline<P>,
    input: I,
    reporter: Arc<dyn StatusReporter>,
    monitor: Arc<LevelMonitor>,
    state: SessionState,
    summary: Option<SessionSummary>,
}

impl<D, P, I> SessionController<D, P, I>
where
    D: DeviceDirectory,
    P: CaptureProvider,
    I: OperatorInput,
{
    pub fn new(
        config: SessionConfiguration,
        directory: D,
        provider: P,
        input: I,
        reporter: Arc<dyn StatusReporter>,
    ) -> Result<Self, SenderError> {
        config.validate().map_err(SenderError::InvalidConfiguration)?;

        let monitor = Arc::new(LevelMonitor::new());
        let mut pipeline = CapturePipeline::new(provider);
        pipeline.add_stage(Arc::new(LevelMeterStage::new(
            Arc::clone(&monitor),
            Arc::clone(&reporter),
        )))?;

        Ok(Self {
            config,
            directory,
            pipeline,
            input,
            reporter,
            monitor,
            state: SessionState::Idle,
            summary: None,
        })
    }

    /// Append a processing stage after the level meter.
    pub fn add_stage(&mut self, stage: Arc<dyn BufferStage>) -> Result<(), SenderError> {
        self.pipeline.add_stage(stage)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn level_monitor(&self) -> Arc<LevelMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Summary of the finished session, also available after a failed run.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    /// Run the session to completion.
    ///
    /// Returns the summary when the operator quit or aborted. Fatal errors
    /// are returned after teardown; the summary then records the failure.
    pub fn run(&mut self) -> Result<SessionSummary, SenderError> {
        if self.state != SessionState::Idle {
            return Err(SenderError::InvalidConfiguration(
                "a controller runs exactly one session".into(),
            ));
        }

        let mut summary = SessionSummary::new(&self.config.service_type);
        let result = self.drive(&mut summary);
        self.teardown();

        summary.stopped_at = Utc::now();
        summary.diagnostics = self.pipeline.diagnostics();
        summary.max_peak = self.monitor.max().peak_magnitude;

        match result {
            Ok(outcome) => {
                log::info!("Session {} ended: {:?}", summary.id, outcome);
                summary.outcome = outcome;
                self.summary = Some(summary.clone());
                Ok(summary)
            }
            Err(e) => {
                log::error!("Session {} failed: {}", summary.id, e);
                self.reporter.on_error(&e);
                summary.outcome = SessionOutcome::Failed(e.to_string());
                self.summary = Some(summary);
                Err(e)
            }
        }
    }

    fn drive(&mut self, summary: &mut SessionSummary) -> Result<SessionOutcome, SenderError> {
        self.transition(SessionState::Discovering);
        self.reporter.on_discovery_started(&self.config.service_type);

        let devices = self
            .directory
            .discover(&self.config.service_type, self.config.discovery_timeout)?;
        log::info!("Discovery found {} receiver(s)", devices.len());
        summary.devices = devices.iter().map(|d| d.display_name.clone()).collect();
        self.reporter.on_devices_found(&devices);

        self.transition(SessionState::AwaitingOperator);
        if devices.is_empty() {
            self.reporter.on_acknowledgement_required();
            if self.input.acknowledge() == Acknowledgement::Abort {
                return Ok(SessionOutcome::Aborted);
            }
        }
        drop(devices);

        let format = self.pipeline.open()?;
        let device_name = self.pipeline.device_name();
        summary.format = Some(format);
        summary.source_device = device_name.clone();

        let (fault_tx, fault_rx) = crossbeam_channel::bounded(1);
        self.pipeline.start(move |error| {
            // Only the first fault matters; the session ends on it.
            let _ = fault_tx.try_send(error);
        })?;

        self.transition(SessionState::Capturing);
        self.reporter.on_capture_started(&format, device_name.as_deref());

        loop {
            if let Ok(fault) = fault_rx.try_recv() {
                return Err(fault);
            }
            if self.input.quit_requested(self.config.poll_interval) {
                return Ok(SessionOutcome::Quit);
            }
        }
    }

    fn teardown(&mut self) {
        self.transition(SessionState::Stopping);
        if let Err(e) = self.pipeline.stop() {
            log::warn!("Failed to stop capture: {}", e);
        }
        if let Err(e) = self.pipeline.close() {
            log::warn!("Failed to close capture device: {}", e);
        }
        self.transition(SessionState::Stopped);
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        log::info!("Session state: {} -> {}", self.state, next);
        self.state = next;
        self.reporter.on_state_changed(next);
    }
}
