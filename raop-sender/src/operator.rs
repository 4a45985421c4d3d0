//! Operator commands read line-by-line from a terminal.
//!
//! A reader thread turns each line into a message on a channel; the session
//! controller observes that channel with a timeout instead of blocking on a
//! keyboard primitive. Closing the input (EOF) and Ctrl-C both count as an
//! interrupt, so the session still tears down before the process exits.

use std::io::BufRead;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use raop_sender_core::{Acknowledgement, OperatorInput};

const QUIT_KEY: &str = "q";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Signal {
    Line(String),
    Closed,
    Interrupted,
}

/// `OperatorInput` fed by a line reader on its own thread.
pub struct LineOperator {
    signals: Receiver<Signal>,
    sender: Sender<Signal>,
}

/// Injects an interrupt into a `LineOperator` from another context, such as
/// a Ctrl-C handler.
#[derive(Clone)]
pub struct Interrupter {
    signals: Sender<Signal>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        let _ = self.signals.send(Signal::Interrupted);
    }
}

impl LineOperator {
    /// Start reading `reader` on a background thread.
    ///
    /// The thread ends at EOF; with stdin it may outlive the session, which
    /// is fine since the process exits right after.
    pub fn spawn<R>(reader: R) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = unbounded();
        let sender = tx.clone();
        thread::Builder::new()
            .name("operator-input".into())
            .spawn(move || {
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    if tx.send(Signal::Line(line.trim().to_lowercase())).is_err() {
                        return;
                    }
                }
                let _ = tx.send(Signal::Closed);
            })?;
        Ok(Self {
            signals: rx,
            sender,
        })
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            signals: self.sender.clone(),
        }
    }
}

impl OperatorInput for LineOperator {
    fn acknowledge(&mut self) -> Acknowledgement {
        match self.signals.recv() {
            Ok(Signal::Line(line)) if line != QUIT_KEY => Acknowledgement::Proceed,
            Ok(_) | Err(_) => Acknowledgement::Abort,
        }
    }

    fn quit_requested(&mut self, wait: Duration) -> bool {
        match self.signals.recv_timeout(wait) {
            Ok(Signal::Line(line)) => line == QUIT_KEY,
            Ok(Signal::Closed) => {
                log::info!("Operator input closed, stopping");
                true
            }
            Ok(Signal::Interrupted) => {
                log::info!("Interrupted, stopping");
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}
