//! One-shot mDNS / DNS-SD sweep for receivers.
//!
//! Browses a service type with `mdns-sd`, keeps every instance that resolves
//! before the deadline, then shuts the daemon down. Nothing is cached between
//! sweeps.

use std::collections::HashSet;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};

use crate::models::device::DeviceRecord;
use crate::models::error::SenderError;
use crate::traits::device_directory::DeviceDirectory;

/// `DeviceDirectory` backed by multicast DNS.
#[derive(Debug, Default, Clone, Copy)]
pub struct MdnsDirectory;

impl MdnsDirectory {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceDirectory for MdnsDirectory {
    fn discover(
        &self,
        service_type: &str,
        timeout: Duration,
    ) -> Result<Vec<DeviceRecord>, SenderError> {
        let daemon = ServiceDaemon::new()
            .map_err(|e| SenderError::DiscoveryFailure(format!("mDNS daemon failed to start: {}", e)))?;

        let receiver = match daemon.browse(service_type) {
            Ok(receiver) => receiver,
            Err(e) => {
                if let Err(e) = daemon.shutdown() {
                    log::debug!("mDNS daemon shutdown failed: {}", e);
                }
                return Err(SenderError::DiscoveryFailure(format!(
                    "browse for {} failed: {}",
                    service_type, e
                )));
            }
        };

        log::debug!("Browsing for {} ({:?})", service_type, timeout);
        let deadline = Instant::now() + timeout;
        let mut sweep = Sweep::new(service_type);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match receiver.recv_timeout(remaining) {
                Ok(ServiceEvent::ServiceResolved(info)) => {
                    sweep.accept(ResolvedService::from_info(&info));
                }
                Ok(other) => log::debug!("mDNS event: {:?}", other),
                // Timeout, or the daemon went away; either way the sweep is over.
                Err(_) => break,
            }
        }

        if let Err(e) = daemon.stop_browse(service_type) {
            log::debug!("stop_browse failed: {}", e);
        }
        if let Err(e) = daemon.shutdown() {
            log::debug!("mDNS daemon shutdown failed: {}", e);
        }

        Ok(sweep.into_devices())
    }
}

/// Fields of a resolved instance that a `DeviceRecord` is built from.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedService {
    fullname: String,
    hostname: String,
    port: u16,
    addresses: Vec<IpAddr>,
}

impl ResolvedService {
    fn from_info(info: &ServiceInfo) -> Self {
        let addresses = info
            .get_addresses()
            .iter()
            .filter_map(|addr| addr.to_string().parse::<IpAddr>().ok())
            .collect();
        Self {
            fullname: info.get_fullname().to_string(),
            hostname: info.get_hostname().to_string(),
            port: info.get_port(),
            addresses,
        }
    }
}

/// Accumulates the replies of one sweep, in arrival order, once per instance.
struct Sweep {
    service_type: String,
    seen: HashSet<String>,
    devices: Vec<DeviceRecord>,
}

impl Sweep {
    fn new(service_type: &str) -> Self {
        Self {
            service_type: service_type.to_string(),
            seen: HashSet::new(),
            devices: Vec::new(),
        }
    }

    fn accept(&mut self, service: ResolvedService) {
        if self.seen.contains(&service.fullname) {
            return;
        }
        let Some(address) = preferred_address(&service.addresses) else {
            log::debug!("Skipping {}: no usable address", service.fullname);
            return;
        };

        let record = DeviceRecord::new(display_name(&service.fullname, &self.service_type), address)
            .with_port(service.port)
            .with_host_name(service.hostname);
        log::debug!("Found receiver {} at {}:{}", record.display_name, address, record.port);

        self.seen.insert(service.fullname);
        self.devices.push(record);
    }

    fn into_devices(self) -> Vec<DeviceRecord> {
        self.devices
    }
}

/// Lowest IPv4 address if any, else the lowest IPv6 address.
fn preferred_address(addresses: &[IpAddr]) -> Option<IpAddr> {
    addresses
        .iter()
        .filter(|a| a.is_ipv4())
        .min()
        .or_else(|| addresses.iter().min())
        .copied()
}

/// Human-readable receiver name from a DNS-SD instance name.
///
/// RAOP instances are named `<hardware-id>@<name>.<service type>`; the
/// hardware id and the service type are dropped.
pub fn display_name(fullname: &str, service_type: &str) -> String {
    let service_suffix = format!(".{}", service_type);
    let instance = fullname.strip_suffix(&service_suffix).unwrap_or(fullname);
    let name = match instance.split_once('@') {
        Some((_, name)) if !name.is_empty() => name,
        _ => instance,
    };
    name.replace("\\ ", " ").replace("\\.", ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAOP: &str = "_raop._tcp.local.";

    fn resolved(fullname: &str, addresses: &[&str]) -> ResolvedService {
        ResolvedService {
            fullname: fullname.to_string(),
            hostname: "receiver.local.".to_string(),
            port: 7000,
            addresses: addresses.iter().map(|a| a.parse().unwrap()).collect(),
        }
    }

    #[test]
    fn display_name_strips_hardware_id_and_service() {
        assert_eq!(
            display_name("0050C212A23F@Living Room._raop._tcp.local.", RAOP),
            "Living Room"
        );
        assert_eq!(display_name("Kitchen._raop._tcp.local.", RAOP), "Kitchen");
    }

    #[test]
    fn display_name_keeps_unexpected_shapes() {
        assert_eq!(display_name("Odd@", RAOP), "Odd@");
        assert_eq!(display_name("Den._airplay._tcp.local.", RAOP), "Den._airplay._tcp.local.");
        assert_eq!(display_name("Mr\\. Speaker._raop._tcp.local.", RAOP), "Mr. Speaker");
    }

    #[test]
    fn sweep_collects_in_arrival_order() {
        let mut sweep = Sweep::new(RAOP);
        sweep.accept(resolved("AA@Living Room._raop._tcp.local.", &["10.0.0.5"]));
        sweep.accept(resolved("BB@Kitchen._raop._tcp.local.", &["10.0.0.9"]));

        let devices = sweep.into_devices();
        assert_eq!(
            devices,
            vec![
                DeviceRecord::new("Living Room", "10.0.0.5".parse().unwrap())
                    .with_port(7000)
                    .with_host_name("receiver.local."),
                DeviceRecord::new("Kitchen", "10.0.0.9".parse().unwrap())
                    .with_port(7000)
                    .with_host_name("receiver.local."),
            ]
        );
    }

    #[test]
    fn sweep_reports_each_instance_once() {
        let mut sweep = Sweep::new(RAOP);
        sweep.accept(resolved("AA@Living Room._raop._tcp.local.", &["10.0.0.5"]));
        sweep.accept(resolved("AA@Living Room._raop._tcp.local.", &["192.168.1.5"]));

        assert_eq!(sweep.into_devices().len(), 1);
    }

    #[test]
    fn sweep_skips_instances_without_address() {
        let mut sweep = Sweep::new(RAOP);
        sweep.accept(resolved("AA@Attic._raop._tcp.local.", &[]));
        assert!(sweep.into_devices().is_empty());
    }

    #[test]
    fn ipv4_is_preferred() {
        let addresses: Vec<IpAddr> = ["fe80::1", "10.0.0.9", "10.0.0.5"]
            .iter()
            .map(|a| a.parse().unwrap())
            .collect();
        assert_eq!(preferred_address(&addresses), Some("10.0.0.5".parse().unwrap()));

        let v6_only: Vec<IpAddr> = vec!["fe80::2".parse().unwrap()];
        assert_eq!(preferred_address(&v6_only), Some("fe80::2".parse().unwrap()));
        assert_eq!(preferred_address(&[]), None);
    }
}
