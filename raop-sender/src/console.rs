//! Console presentation of a session.

use std::io::{self, Write};

use parking_lot::Mutex;

use raop_sender_core::{
    AudioFormat, DeviceRecord, LevelReading, MeterLine, SenderError, SessionState, StatusReporter,
};

struct Console<W> {
    out: W,
    meter: MeterLine,
    /// The cursor sits at the end of a meter line.
    meter_active: bool,
    /// The session reached `Capturing` at some point.
    captured: bool,
}

/// `StatusReporter` writing status lines and an in-place meter to a terminal.
///
/// One lock guards the output so a status line never lands in the middle of
/// a meter refresh. The meter path only ever `try_lock`s: if the controller
/// is printing, that refresh is skipped instead of stalling the audio thread.
pub struct ConsoleReporter<W: Write + Send> {
    console: Mutex<Console<W>>,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(meter_width: usize) -> Self {
        Self::new(io::stdout(), meter_width)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, meter_width: usize) -> Self {
        Self {
            console: Mutex::new(Console {
                out,
                meter: MeterLine::new(meter_width),
                meter_active: false,
                captured: false,
            }),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.console.into_inner().out
    }

    fn print_lines(&self, lines: &[String]) {
        let mut console = self.console.lock();
        let Console { out, meter_active, .. } = &mut *console;
        if *meter_active {
            let _ = writeln!(out);
            *meter_active = false;
        }
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
        let _ = out.flush();
    }
}

impl<W: Write + Send> StatusReporter for ConsoleReporter<W> {
    fn on_state_changed(&self, state: SessionState) {
        log::debug!("Session state: {}", state);
        if state.is_capturing() {
            self.console.lock().captured = true;
            return;
        }
        let captured = self.console.lock().captured;
        if state.is_terminal() && captured {
            self.print_lines(&["Capture stopped.".to_string()]);
        }
    }

    fn on_discovery_started(&self, service_type: &str) {
        self.print_lines(&[format!("1. Scanning for AirPlay devices ({})...", service_type)]);
    }

    fn on_devices_found(&self, devices: &[DeviceRecord]) {
        if devices.is_empty() {
            self.print_lines(&["No devices found.".to_string()]);
            return;
        }
        let mut lines = vec![format!("Found {} devices:", devices.len())];
        lines.extend(devices.iter().map(|d| format!(" - {}", d)));
        self.print_lines(&lines);
    }

    fn on_acknowledgement_required(&self) {
        self.print_lines(&[
            "Press Enter to start loopback capture anyway (local test), or 'q' + Enter to abort..."
                .to_string(),
        ]);
    }

    fn on_capture_started(&self, format: &AudioFormat, device_name: Option<&str>) {
        let source = match device_name {
            Some(name) => format!("Source: {} ({})", format, name),
            None => format!("Source: {}", format),
        };
        self.print_lines(&[
            String::new(),
            "2. Loopback capture running.".to_string(),
            source,
            "Capture started! Play some music to see the level meter.".to_string(),
            "Type 'q' + Enter to quit.".to_string(),
        ]);
    }

    fn show_level(&self, reading: LevelReading) {
        let Some(mut console) = self.console.try_lock() else {
            return;
        };
        let Console {
            out,
            meter,
            meter_active,
            ..
        } = &mut *console;
        let _ = out.write_all(meter.render(reading).as_bytes());
        let _ = out.flush();
        *meter_active = true;
    }

    fn on_error(&self, error: &SenderError) {
        self.print_lines(&[format!("Error: {}", error)]);
    }
}
