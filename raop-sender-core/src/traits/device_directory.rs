use std::time::Duration;

use crate::models::device::DeviceRecord;
use crate::models::error::SenderError;

/// One-shot lookup of receivers advertising a service type.
pub trait DeviceDirectory {
    /// Collect every receiver answering for `service_type` before `timeout`.
    ///
    /// An empty list is a normal result. Only an unusable network stack is
    /// reported, as `SenderError::DiscoveryFailure`. Never retries.
    fn discover(
        &self,
        service_type: &str,
        timeout: Duration,
    ) -> Result<Vec<DeviceRecord>, SenderError>;
}
