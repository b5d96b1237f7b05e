//! WiFi control port

use trait_variant::make;

use crate::core::{error::WifiResult, queue::ScanResultSink};

/// Abstraction over the device's WiFi control interface
///
/// The provisioning state machine only needs two operations: start a scan and
/// hand over credentials. Implementations are free to talk to wpa_supplicant,
/// a vendor SDK, or a test double.
#[make(Send)]
pub trait WifiBackend: Sync + 'static {
    /// Request a scan for nearby access points
    ///
    /// Must return without waiting for the scan to finish. Each discovered
    /// access point is pushed into `results` as it becomes available, zero or
    /// more times, in discovery order.
    async fn request_scan(&self, results: ScanResultSink) -> WifiResult<()>;

    /// Store credentials for a network so the device can join it
    ///
    /// Must not tear down an existing network session.
    async fn apply_credentials(&self, ssid: &str, password: &str) -> WifiResult<()>;
}
