use thiserror::Error;

/// Errors surfaced by discovery, capture and session control.
///
/// Zero discovered devices is not an error, and neither is a buffer whose
/// byte count is not a whole number of samples.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SenderError {
    /// The network stack cannot issue a discovery query.
    #[error("discovery failed: {0}")]
    DiscoveryFailure(String),

    /// No loopback-capable output device, or the OS denied access.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The audio subsystem reported an error mid-session.
    #[error("capture fault: {0}")]
    CaptureFault(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl SenderError {
    /// Whether this error ends the session before capture could start.
    pub fn is_pre_capture(&self) -> bool {
        matches!(self, Self::DiscoveryFailure(_) | Self::DeviceUnavailable(_))
    }
}
