use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// A receiver found by one discovery sweep.
///
/// Immutable snapshot; no identity beyond its fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub display_name: String,
    pub address: IpAddr,
    pub port: u16,
    pub host_name: String,
}

impl DeviceRecord {
    pub fn new(display_name: impl Into<String>, address: IpAddr) -> Self {
        Self {
            display_name: display_name.into(),
            address,
            port: 0,
            host_name: String::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = host_name.into();
        self
    }
}

impl std::fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.address)
    }
}
