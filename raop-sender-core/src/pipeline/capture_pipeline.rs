use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::audio_models::{AudioBuffer, AudioFormat, PipelineDiagnostics};
use crate::models::error::SenderError;
use crate::traits::buffer_stage::BufferStage;
use crate::traits::capture_provider::{AudioBufferCallback, CaptureFaultCallback, CaptureProvider};

/// Lifecycle of the pipeline's device binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Open,
    Delivering,
    Stopped,
    Closed,
}

#[derive(Debug, Default)]
struct DeliveryCounters {
    delivered: AtomicU64,
    empty: AtomicU64,
    dropped_after_stop: AtomicU64,
    bytes: AtomicU64,
}

impl DeliveryCounters {
    fn snapshot(&self) -> PipelineDiagnostics {
        PipelineDiagnostics {
            buffers_delivered: self.delivered.load(Ordering::Relaxed),
            empty_buffers: self.empty.load(Ordering::Relaxed),
            buffers_dropped_after_stop: self.dropped_after_stop.load(Ordering::Relaxed),
            bytes_delivered: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Loopback capture session routed through an ordered chain of stages.
///
/// Wraps a platform `CaptureProvider` and enforces its contract on the
/// provider's behalf:
/// ```text
/// [CaptureProvider] → [delivery gate] → [LevelMeterStage] → [TransmitStage …]
/// ```
/// Once `stop()` returns the gate is closed: any buffer the provider still
/// delivers is dropped and counted, and any callback that was in flight has
/// finished.
pub struct CapturePipeline<P: CaptureProvider> {
    provider: P,
    phase: Phase,
    format: Option<AudioFormat>,
    stages: Vec<Arc<dyn BufferStage>>,
    gate: Arc<RwLock<bool>>,
    counters: Arc<DeliveryCounters>,
}

impl<P: CaptureProvider> CapturePipeline<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            phase: Phase::Idle,
            format: None,
            stages: Vec::new(),
            gate: Arc::new(RwLock::new(false)),
            counters: Arc::new(DeliveryCounters::default()),
        }
    }

    /// Append a stage. Stages run in the order they were added.
    pub fn add_stage(&mut self, stage: Arc<dyn BufferStage>) -> Result<(), SenderError> {
        if self.phase == Phase::Delivering {
            return Err(SenderError::InvalidConfiguration(
                "cannot add a stage while delivering".into(),
            ));
        }
        self.stages.push(stage);
        Ok(())
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_string()).collect()
    }

    /// Format reported by the device at `open()`.
    pub fn format(&self) -> Option<AudioFormat> {
        self.format
    }

    pub fn device_name(&self) -> Option<String> {
        self.provider.device_name()
    }

    pub fn is_delivering(&self) -> bool {
        self.phase == Phase::Delivering
    }

    pub fn diagnostics(&self) -> PipelineDiagnostics {
        self.counters.snapshot()
    }

    /// Bind to the default output device in loopback mode.
    pub fn open(&mut self) -> Result<AudioFormat, SenderError> {
        if self.phase != Phase::Idle {
            return Err(SenderError::InvalidConfiguration(
                "capture pipeline can only be opened once".into(),
            ));
        }
        // Mark as touched before binding so close() always reaches the provider.
        self.phase = Phase::Open;
        let format = self.provider.open()?;
        log::info!("Loopback capture opened: {}", format);
        self.format = Some(format);
        Ok(format)
    }

    /// Start delivering buffers through the stage chain.
    ///
    /// `on_fault` is called at most once, from the delivery thread, when the
    /// provider or a stage fails.
    pub fn start<F>(&mut self, on_fault: F) -> Result<(), SenderError>
    where
        F: Fn(SenderError) + Send + Sync + 'static,
    {
        if self.phase != Phase::Open {
            return Err(SenderError::InvalidConfiguration(
                "can only start an open, idle pipeline".into(),
            ));
        }
        let format = self.format.ok_or_else(|| {
            SenderError::InvalidConfiguration("capture format not known".into())
        })?;

        let faulted = Arc::new(AtomicBool::new(false));
        let on_fault: CaptureFaultCallback = Arc::new(move |error: SenderError| {
            if !faulted.swap(true, Ordering::SeqCst) {
                on_fault(error);
            }
        });

        let gate = Arc::clone(&self.gate);
        let counters = Arc::clone(&self.counters);
        let stages: Arc<[Arc<dyn BufferStage>]> = self.stages.clone().into();
        let stage_fault = Arc::clone(&on_fault);

        let callback: AudioBufferCallback = Arc::new(move |buffer: AudioBuffer<'_>| {
            let open = gate.read();
            if !*open {
                counters.dropped_after_stop.fetch_add(1, Ordering::Relaxed);
                return;
            }
            if buffer.is_empty() {
                counters.empty.fetch_add(1, Ordering::Relaxed);
                return;
            }
            counters.delivered.fetch_add(1, Ordering::Relaxed);
            counters
                .bytes
                .fetch_add(buffer.valid_bytes() as u64, Ordering::Relaxed);

            for stage in stages.iter() {
                if let Err(e) = stage.process(&buffer, &format) {
                    log::error!("Stage '{}' failed: {}", stage.name(), e);
                    stage_fault(SenderError::CaptureFault(format!("{}: {}", stage.name(), e)));
                    return;
                }
            }
        });

        *self.gate.write() = true;
        if let Err(e) = self.provider.start(callback, on_fault) {
            *self.gate.write() = false;
            return Err(e);
        }
        self.phase = Phase::Delivering;
        log::info!("Capture delivering through stages: {:?}", self.stage_names());
        Ok(())
    }

    /// Halt delivery. Idempotent.
    pub fn stop(&mut self) -> Result<(), SenderError> {
        // Waits for any callback holding the read side to finish.
        *self.gate.write() = false;

        if self.phase != Phase::Delivering {
            return Ok(());
        }
        self.phase = Phase::Stopped;
        self.provider.stop()?;
        log::info!("Capture stopped: {:?}", self.counters.snapshot());
        Ok(())
    }

    /// Stop if needed and release the device binding. Idempotent.
    pub fn close(&mut self) -> Result<(), SenderError> {
        if self.phase == Phase::Closed {
            return Ok(());
        }
        let stopped = self.stop();
        let was_bound = self.phase != Phase::Idle;
        self.phase = Phase::Closed;
        if was_bound {
            self.provider.close()?;
            log::debug!("Capture device released");
        }
        stopped
    }
}

impl<P: CaptureProvider> Drop for CapturePipeline<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close capture pipeline: {}", e);
        }
    }
}
