//! Mock WiFi backend for testing

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::WifiBackend;
use crate::core::error::{WifiError, WifiResult};
use crate::core::queue::ScanResultSink;
use crate::core::types::AccessPointRecord;

/// Internal state for the mock backend
#[derive(Debug, Default)]
struct MockState {
    scan_results: Vec<AccessPointRecord>,
    pending_scans: Vec<ScanResultSink>,
    scan_requests: usize,
    applied: Vec<(String, String)>,
    should_fail_scan: bool,
    should_fail_apply: bool,
}

/// Mock WiFi backend for testing
///
/// Scan requests are parked until [`MockWifiBackend::complete_scans`] is
/// called, which mimics results arriving some time after the request.
#[derive(Debug, Clone, Default)]
pub struct MockWifiBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockWifiBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the access points reported by the next completed scans
    pub async fn set_scan_results(&self, records: Vec<AccessPointRecord>) {
        self.inner.lock().await.scan_results = records;
    }

    /// Configure mock to fail scan requests
    pub async fn set_scan_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_scan = should_fail;
    }

    /// Configure mock to fail credential application
    pub async fn set_apply_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_apply = should_fail;
    }

    /// Deliver the configured results to every outstanding scan request
    pub async fn complete_scans(&self) {
        let mut state = self.inner.lock().await;
        let sinks = std::mem::take(&mut state.pending_scans);
        for sink in sinks {
            for record in &state.scan_results {
                sink.push(record.clone());
            }
        }
    }

    /// Number of scan requests received
    pub async fn scan_requests(&self) -> usize {
        self.inner.lock().await.scan_requests
    }

    /// Credentials applied so far, in order
    pub async fn applied_credentials(&self) -> Vec<(String, String)> {
        self.inner.lock().await.applied.clone()
    }
}

impl WifiBackend for MockWifiBackend {
    async fn request_scan(&self, results: ScanResultSink) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        if state.should_fail_scan {
            return Err(WifiError::ScanFailed("Mock scan failure".into()));
        }
        state.scan_requests += 1;
        state.pending_scans.push(results);
        Ok(())
    }

    async fn apply_credentials(&self, ssid: &str, password: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        if state.should_fail_apply {
            return Err(WifiError::CredentialsRejected("Mock apply failure".into()));
        }
        state.applied.push((ssid.to_string(), password.to_string()));
        Ok(())
    }
}
