//! WASAPI loopback capture provider for system audio.
//!
//! Captures the mix going to the default render endpoint using
//! `AUDCLNT_STREAMFLAGS_LOOPBACK`. No special permissions are needed;
//! DRM-protected audio is silenced by the OS.
//!
//! All COM objects live on one dedicated thread, which binds the device on
//! `open()`, delivers buffers between `start()` and `stop()`, and releases
//! everything on `close()`.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use windows::core::PCWSTR;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;
use windows::Win32::System::Threading::*;

use raop_sender_core::{
    AudioBuffer, AudioBufferCallback, AudioFormat, CaptureFaultCallback, CaptureProvider,
    SenderError,
};

use crate::device_enumerator;

/// Interval between polls of the capture client for new packets.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared-mode buffer length requested from the engine, in 100ns units.
const BUFFER_DURATION: i64 = 1_000_000;

enum Command {
    Start {
        on_buffer: AudioBufferCallback,
        on_fault: CaptureFaultCallback,
    },
    Stop(Sender<()>),
    Close,
}

/// WASAPI loopback capture on the default render device.
pub struct WasapiLoopbackCapture {
    device_name: Option<String>,
    commands: Option<Sender<Command>>,
    capture_handle: Option<thread::JoinHandle<()>>,
    delivering: bool,
}

impl WasapiLoopbackCapture {
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            commands: None,
            capture_handle: None,
            delivering: false,
        }
    }

    fn send(&self, command: Command) -> Result<(), SenderError> {
        let commands = self
            .commands
            .as_ref()
            .ok_or_else(|| SenderError::InvalidConfiguration("loopback capture not open".into()))?;
        commands
            .send(command)
            .map_err(|_| SenderError::CaptureFault("loopback capture thread exited".into()))
    }
}

impl CaptureProvider for WasapiLoopbackCapture {
    fn open(&mut self) -> Result<AudioFormat, SenderError> {
        if self.commands.is_some() {
            return Err(SenderError::InvalidConfiguration(
                "loopback capture already open".into(),
            ));
        }

        let (command_tx, command_rx) = unbounded();
        let (ready_tx, ready_rx) = bounded(1);

        let handle = thread::Builder::new()
            .name("wasapi-loopback-capture".into())
            .spawn(move || capture_thread(command_rx, ready_tx))
            .map_err(|e| SenderError::DeviceUnavailable(format!("failed to spawn loopback thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok((format, device_name))) => {
                log::debug!("Loopback bound to {:?} ({})", device_name, format);
                self.device_name = device_name;
                self.commands = Some(command_tx);
                self.capture_handle = Some(handle);
                Ok(format)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(SenderError::DeviceUnavailable(
                    "loopback capture thread exited during open".into(),
                ))
            }
        }
    }

    fn start(
        &mut self,
        on_buffer: AudioBufferCallback,
        on_fault: CaptureFaultCallback,
    ) -> Result<(), SenderError> {
        if self.delivering {
            return Err(SenderError::InvalidConfiguration(
                "loopback capture already running".into(),
            ));
        }
        self.send(Command::Start { on_buffer, on_fault })?;
        self.delivering = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), SenderError> {
        if !self.delivering {
            return Ok(());
        }
        self.delivering = false;

        let (ack_tx, ack_rx) = bounded(1);
        self.send(Command::Stop(ack_tx))?;
        // The capture thread acknowledges only after its last callback returned.
        let _ = ack_rx.recv();
        Ok(())
    }

    fn close(&mut self) -> Result<(), SenderError> {
        self.stop()?;
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(Command::Close);
        }
        if let Some(handle) = self.capture_handle.take() {
            if handle.join().is_err() {
                log::error!("Loopback capture thread panicked");
            }
        }
        Ok(())
    }

    fn device_name(&self) -> Option<String> {
        self.device_name.clone()
    }
}

impl Drop for WasapiLoopbackCapture {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

type OpenResult = Result<(AudioFormat, Option<String>), SenderError>;

/// Body of the dedicated capture thread.
fn capture_thread(commands: Receiver<Command>, ready: Sender<OpenResult>) {
    unsafe {
        if let Err(e) = CoInitializeEx(None, COINIT_MULTITHREADED).ok() {
            let _ = ready.send(Err(SenderError::DeviceUnavailable(format!(
                "CoInitializeEx failed: {}",
                e
            ))));
            return;
        }
    }
    let _com_guard = CoUninitializeGuard;

    let session = match LoopbackSession::bind() {
        Ok(session) => session,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    if ready
        .send(Ok((session.format, session.device_name.clone())))
        .is_err()
    {
        return;
    }

    session.serve(&commands);
    log::debug!("Loopback capture thread exiting");
}

/// COM objects for one bound loopback stream.
struct LoopbackSession {
    audio_client: IAudioClient,
    capture_client: IAudioCaptureClient,
    mix_format: *mut WAVEFORMATEX,
    block_align: usize,
    format: AudioFormat,
    device_name: Option<String>,
}

impl LoopbackSession {
    /// Sequence:
    /// 1. Get default render endpoint
    /// 2. Activate IAudioClient
    /// 3. Initialize with LOOPBACK flag in shared mode
    /// 4. Get IAudioCaptureClient
    fn bind() -> Result<Self, SenderError> {
        unsafe {
            // Default RENDER endpoint: loopback reads what it is playing.
            let device = device_enumerator::default_render_device()?;
            let device_name = device_enumerator::friendly_name(&device);

            let audio_client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| SenderError::DeviceUnavailable(format!("access to output device denied: {}", e)))?;

            let mix_format_ptr = audio_client
                .GetMixFormat()
                .map_err(|e| SenderError::DeviceUnavailable(format!("GetMixFormat failed: {}", e)))?;

            let mix_format = &*mix_format_ptr;
            let format = AudioFormat::new(
                mix_format.nSamplesPerSec,
                mix_format.wBitsPerSample,
                mix_format.nChannels,
            );
            let block_align = mix_format.nBlockAlign as usize;

            let initialized = audio_client.Initialize(
                AUDCLNT_SHAREMODE_SHARED,
                AUDCLNT_STREAMFLAGS_LOOPBACK | AUDCLNT_STREAMFLAGS_NOPERSIST,
                BUFFER_DURATION,
                0,
                mix_format,
                None,
            );
            if let Err(e) = initialized {
                CoTaskMemFree(Some(mix_format_ptr as *const _));
                return Err(SenderError::DeviceUnavailable(format!(
                    "IAudioClient::Initialize (loopback) failed: {}",
                    e
                )));
            }

            let capture_client: IAudioCaptureClient = match audio_client.GetService() {
                Ok(client) => client,
                Err(e) => {
                    CoTaskMemFree(Some(mix_format_ptr as *const _));
                    return Err(SenderError::DeviceUnavailable(format!("GetService failed: {}", e)));
                }
            };

            Ok(Self {
                audio_client,
                capture_client,
                mix_format: mix_format_ptr,
                block_align,
                format,
                device_name,
            })
        }
    }

    /// Handle commands until `Close`, polling for packets while started.
    fn serve(&self, commands: &Receiver<Command>) {
        let mut delivery: Option<(AudioBufferCallback, CaptureFaultCallback)> = None;
        let mut silence: Vec<u8> = Vec::new();

        loop {
            let command = if delivery.is_some() {
                match commands.recv_timeout(POLL_INTERVAL) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => Some(Command::Close),
                }
            } else {
                Some(commands.recv().unwrap_or(Command::Close))
            };

            match command {
                Some(Command::Start { on_buffer, on_fault }) => match self.begin() {
                    Ok(()) => delivery = Some((on_buffer, on_fault)),
                    Err(e) => on_fault(e),
                },
                Some(Command::Stop(ack)) => {
                    if delivery.take().is_some() {
                        unsafe {
                            let _ = self.audio_client.Stop();
                        }
                    }
                    let _ = ack.send(());
                }
                Some(Command::Close) => break,
                None => {}
            }

            let fault = match &delivery {
                Some((on_buffer, _)) => self.drain(on_buffer, &mut silence).err(),
                None => None,
            };
            if let Some(e) = fault {
                log::error!("Loopback capture error: {}", e);
                unsafe {
                    let _ = self.audio_client.Stop();
                }
                if let Some((_, on_fault)) = delivery.take() {
                    on_fault(e);
                }
            }
        }
    }

    fn begin(&self) -> Result<(), SenderError> {
        unsafe {
            // MMCSS registration for real-time priority
            let mut task_index: u32 = 0;
            let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
            let _mmcss_handle = AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index);

            self.audio_client
                .Start()
                .map_err(|e| SenderError::CaptureFault(format!("IAudioClient::Start failed: {}", e)))
        }
    }

    /// Deliver every packet currently queued by the engine.
    fn drain(&self, on_buffer: &AudioBufferCallback, silence: &mut Vec<u8>) -> Result<(), SenderError> {
        unsafe {
            let mut packet_length = self
                .capture_client
                .GetNextPacketSize()
                .map_err(|e| SenderError::CaptureFault(format!("GetNextPacketSize failed: {}", e)))?;

            while packet_length > 0 {
                let mut buffer_ptr: *mut u8 = std::ptr::null_mut();
                let mut num_frames: u32 = 0;
                let mut flags: u32 = 0;

                self.capture_client
                    .GetBuffer(&mut buffer_ptr, &mut num_frames, &mut flags, None, None)
                    .map_err(|e| SenderError::CaptureFault(format!("GetBuffer failed: {}", e)))?;

                if num_frames > 0 && !buffer_ptr.is_null() {
                    let byte_count = num_frames as usize * self.block_align;

                    if flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 {
                        silence.clear();
                        silence.resize(byte_count, 0);
                        on_buffer(AudioBuffer::full(silence));
                    } else {
                        let bytes = std::slice::from_raw_parts(buffer_ptr as *const u8, byte_count);
                        on_buffer(AudioBuffer::full(bytes));
                    }
                }

                self.capture_client
                    .ReleaseBuffer(num_frames)
                    .map_err(|e| SenderError::CaptureFault(format!("ReleaseBuffer failed: {}", e)))?;

                packet_length = self
                    .capture_client
                    .GetNextPacketSize()
                    .map_err(|e| SenderError::CaptureFault(format!("GetNextPacketSize failed: {}", e)))?;
            }
        }
        Ok(())
    }
}

impl Drop for LoopbackSession {
    fn drop(&mut self) {
        unsafe {
            let _ = self.audio_client.Stop();
            CoTaskMemFree(Some(self.mix_format as *const _));
        }
    }
}

struct CoUninitializeGuard;

impl Drop for CoUninitializeGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
