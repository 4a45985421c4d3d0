use std::time::Duration;

/// Service type advertised by AirPlay audio receivers.
pub const RAOP_SERVICE_TYPE: &str = "_raop._tcp.local.";

/// Configuration for one sender session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfiguration {
    /// mDNS service type to browse for (default: `_raop._tcp.local.`).
    pub service_type: String,

    /// How long the discovery sweep collects replies (default: 3s).
    pub discovery_timeout: Duration,

    /// Idle sleep between checks for the quit signal (default: 100ms).
    pub poll_interval: Duration,

    /// Width of the level meter in bars (default: 50).
    pub meter_width: usize,
}

impl SessionConfiguration {
    pub const MAX_METER_WIDTH: usize = 200;

    pub fn validate(&self) -> Result<(), String> {
        if self.service_type.is_empty() {
            return Err("service type must not be empty".into());
        }
        if !self.service_type.ends_with(".local.") {
            return Err(format!(
                "service type must be fully qualified (end in \".local.\"): {}",
                self.service_type
            ));
        }
        if self.discovery_timeout.is_zero() {
            return Err("discovery timeout must be positive".into());
        }
        if self.poll_interval.is_zero() {
            return Err("poll interval must be positive".into());
        }
        if self.meter_width == 0 || self.meter_width > Self::MAX_METER_WIDTH {
            return Err(format!(
                "meter width must be between 1 and {}: {}",
                Self::MAX_METER_WIDTH,
                self.meter_width
            ));
        }
        Ok(())
    }
}

impl Default for SessionConfiguration {
    fn default() -> Self {
        Self {
            service_type: RAOP_SERVICE_TYPE.to_string(),
            discovery_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(100),
            meter_width: 50,
        }
    }
}
