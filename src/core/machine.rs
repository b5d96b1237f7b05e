//! Message-driven provisioning state machine

use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::{
    backend::WifiBackend,
    core::{
        error::{ServiceError, ServiceResult},
        queue::{InboundQueue, QueueStats, ScanResultQueue, ScanResultSink},
        types::{AccessPointRecord, ConfigState},
    },
    protocol::{Credentials, ProvisioningCommand, decode_message, encode_scan_response},
    transport::RadioTransport,
};

/// Invoked after credentials were handed to the WiFi backend successfully
pub type ProvisionCallback = Box<dyn Fn() + Send + Sync>;

/// Counters describing what the machine has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub scans_requested: u64,
    pub credentials_applied: u64,
    pub commands_rejected: u64,
    pub malformed_messages: u64,
    pub ignored_messages: u64,
    pub frames_sent: u64,
    pub frames_failed: u64,
}

/// Turns queued radio frames into WiFi commands and streams scan results back
///
/// The machine does no work on its own. The owner calls
/// [`run_cycle`](Self::run_cycle) repeatedly; each call performs at most one
/// state transition, parses at most one inbound message, and then sends every
/// scan result queued since the previous call.
pub struct ProvisioningStateMachine<W: WifiBackend, R: RadioTransport> {
    state: ConfigState,
    inbound: InboundQueue,
    scan_results: ScanResultQueue,
    scan_sink: ScanResultSink,
    wifi: Arc<W>,
    radio: Arc<R>,
    provision_callback: Option<ProvisionCallback>,
    stats: CycleStats,
}

impl<W: WifiBackend, R: RadioTransport> ProvisioningStateMachine<W, R> {
    /// Create a machine consuming `inbound`, which the radio adapter feeds
    pub fn new(wifi: Arc<W>, radio: Arc<R>, inbound: InboundQueue) -> Self {
        let (scan_sink, scan_results) = ScanResultQueue::channel();
        Self {
            state: ConfigState::Setup,
            inbound,
            scan_results,
            scan_sink,
            wifi,
            radio,
            provision_callback: None,
            stats: CycleStats::default(),
        }
    }

    /// Register the callback fired after credentials were applied
    ///
    /// Only one callback can be registered for the lifetime of the machine.
    pub fn set_provision_callback<F>(&mut self, callback: F) -> ServiceResult<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.provision_callback.is_some() {
            return Err(ServiceError::CallbackAlreadySet);
        }
        self.provision_callback = Some(Box::new(callback));
        Ok(())
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn inbound_stats(&self) -> &QueueStats {
        self.inbound.stats()
    }

    pub fn scan_result_stats(&self) -> &QueueStats {
        self.scan_results.stats()
    }

    /// Producer handle for the scan-result queue
    pub fn scan_result_sink(&self) -> ScanResultSink {
        self.scan_sink.clone()
    }

    /// Run one cycle
    ///
    /// Never fails. Bad input and transmit errors are logged and counted.
    pub async fn run_cycle(&mut self) {
        self.stats.cycles += 1;

        let next_state = match self.state {
            ConfigState::Setup => ConfigState::Idle,
            ConfigState::Idle if self.inbound.is_empty() => ConfigState::Idle,
            ConfigState::Idle => ConfigState::ParseMessage,
            ConfigState::ParseMessage => {
                self.parse_message().await;
                ConfigState::Idle
            }
        };

        if next_state != self.state {
            trace!("State transition: {} -> {}", self.state, next_state);
            self.state = next_state;
        }

        self.send_scan_results().await;
    }

    /// Consume exactly one inbound message and act on it
    async fn parse_message(&mut self) {
        let Some(message) = self.inbound.pop() else {
            debug!("Inbound queue drained before parsing");
            return;
        };

        trace!(len = message.len(), "Parsing message");
        let decoded = decode_message(&message);
        drop(message);

        match decoded {
            Ok(command) => self.dispatch(command).await,
            Err(e) if e.is_malformed() => {
                warn!("Dropping malformed message: {}", e);
                self.stats.malformed_messages += 1;
            }
            Err(e) if e.is_rejected() => {
                warn!("Failure parsing WiFi credentials: {}", e);
                self.stats.commands_rejected += 1;
            }
            Err(e) => {
                debug!("Ignoring message: {}", e);
                self.stats.ignored_messages += 1;
            }
        }
    }

    async fn dispatch(&mut self, command: ProvisioningCommand) {
        match command {
            ProvisioningCommand::ScanRequest => self.request_scan().await,
            ProvisioningCommand::SetCredentials(credentials) => {
                self.apply_credentials(credentials).await
            }
        }
    }

    async fn request_scan(&mut self) {
        match self.wifi.request_scan(self.scan_sink.clone()).await {
            Ok(()) => {
                info!("WiFi scan requested");
                self.stats.scans_requested += 1;
            }
            Err(e) => warn!("WiFi scan request failed: {}", e),
        }
    }

    async fn apply_credentials(&mut self, credentials: Credentials) {
        if let Err(e) = self
            .wifi
            .apply_credentials(credentials.ssid(), credentials.password())
            .await
        {
            warn!(ssid = %credentials.ssid(), "Failed to apply WiFi credentials: {}", e);
            return;
        }

        info!(ssid = %credentials.ssid(), "WiFi credentials set");
        self.stats.credentials_applied += 1;

        if let Some(callback) = &self.provision_callback {
            callback();
        }
    }

    /// Serialize and send every queued scan result, one frame each
    async fn send_scan_results(&mut self) {
        while let Some(record) = self.scan_results.pop() {
            self.send_scan_result(&record).await;
        }
    }

    async fn send_scan_result(&mut self, record: &AccessPointRecord) {
        let frame = match encode_scan_response(record) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(ssid = %record.ssid, "Dropping scan result: {}", e);
                self.stats.frames_failed += 1;
                return;
            }
        };

        trace!(frame = %String::from_utf8_lossy(&frame), "Sending scan result");
        match self.radio.send(&frame).await {
            Ok(()) => self.stats.frames_sent += 1,
            Err(e) => {
                warn!(ssid = %record.ssid, "Failed to send scan result: {}", e);
                self.stats.frames_failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::MockWifiBackend,
        core::{queue::InboundSender, types::SecurityKind},
        transport::MockRadio,
    };
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Harness {
        machine: ProvisioningStateMachine<MockWifiBackend, MockRadio>,
        sender: InboundSender,
        wifi: MockWifiBackend,
        radio: MockRadio,
        callbacks: Arc<AtomicUsize>,
    }

    impl Harness {
        /// Machine past its setup cycle, with a counting callback
        async fn new() -> Self {
            let wifi = MockWifiBackend::new();
            let radio = MockRadio::new();
            let (sender, inbound) = InboundQueue::channel();
            let mut machine = ProvisioningStateMachine::new(
                Arc::new(wifi.clone()),
                Arc::new(radio.clone()),
                inbound,
            );

            let callbacks = Arc::new(AtomicUsize::new(0));
            let counter = callbacks.clone();
            machine
                .set_provision_callback(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();

            machine.run_cycle().await;
            assert_eq!(machine.state(), ConfigState::Idle);

            Self {
                machine,
                sender,
                wifi,
                radio,
                callbacks,
            }
        }

        /// Queue one message and run the two cycles needed to parse it
        async fn deliver(&mut self, text: &str) {
            self.sender.push_frame(text.as_bytes()).unwrap();
            self.machine.run_cycle().await;
            assert_eq!(self.machine.state(), ConfigState::ParseMessage);
            self.machine.run_cycle().await;
            assert_eq!(self.machine.state(), ConfigState::Idle);
        }

        fn callback_count(&self) -> usize {
            self.callbacks.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_setup_then_idle() {
        let (_sender, inbound) = InboundQueue::channel();
        let mut machine = ProvisioningStateMachine::new(
            Arc::new(MockWifiBackend::new()),
            Arc::new(MockRadio::new()),
            inbound,
        );
        assert_eq!(machine.state(), ConfigState::Setup);

        machine.run_cycle().await;
        assert_eq!(machine.state(), ConfigState::Idle);

        // Idle with nothing queued stays idle
        machine.run_cycle().await;
        machine.run_cycle().await;
        assert_eq!(machine.state(), ConfigState::Idle);
        assert_eq!(machine.stats().cycles, 3);
    }

    #[tokio::test]
    async fn test_one_message_per_parse_cycle() {
        let mut h = Harness::new().await;
        h.sender.push_frame(br#"{"msg_type":"noop"}"#).unwrap();
        h.sender.push_frame(br#"{"msg_type":"noop"}"#).unwrap();

        h.machine.run_cycle().await;
        assert_eq!(h.machine.state(), ConfigState::ParseMessage);
        h.machine.run_cycle().await;
        assert_eq!(h.machine.inbound_stats().popped(), 1);
        assert_eq!(h.machine.inbound_stats().depth(), 1);

        h.machine.run_cycle().await;
        assert_eq!(h.machine.state(), ConfigState::ParseMessage);
        h.machine.run_cycle().await;
        assert_eq!(h.machine.state(), ConfigState::Idle);
        assert_eq!(h.machine.inbound_stats().popped(), 2);
        assert_eq!(h.machine.inbound_stats().depth(), 0);
        assert_eq!(h.machine.stats().ignored_messages, 2);
    }

    #[tokio::test]
    async fn test_set_credentials_applies_and_notifies() {
        let mut h = Harness::new().await;
        h.deliver(r#"{"msg_type":"set_creds","ssid":"Home","password":"secret"}"#)
            .await;

        assert_eq!(
            h.wifi.applied_credentials().await,
            vec![("Home".to_string(), "secret".to_string())]
        );
        assert_eq!(h.callback_count(), 1);
        assert_eq!(h.machine.stats().credentials_applied, 1);
        assert!(h.radio.sent_frames().await.is_empty());
    }

    #[tokio::test]
    async fn test_set_credentials_missing_password() {
        let mut h = Harness::new().await;
        h.deliver(r#"{"msg_type":"set_creds","ssid":"Home"}"#).await;

        assert!(h.wifi.applied_credentials().await.is_empty());
        assert_eq!(h.callback_count(), 0);
        assert_eq!(h.machine.stats().commands_rejected, 1);
    }

    #[tokio::test]
    async fn test_set_credentials_empty_ssid() {
        let mut h = Harness::new().await;
        h.deliver(r#"{"msg_type":"set_creds","ssid":"","password":"secret"}"#)
            .await;

        assert!(h.wifi.applied_credentials().await.is_empty());
        assert_eq!(h.callback_count(), 0);
        assert_eq!(h.machine.stats().commands_rejected, 1);
    }

    #[tokio::test]
    async fn test_credentials_before_msg_type_do_not_count() {
        let mut h = Harness::new().await;
        h.deliver(r#"{"ssid":"Home","password":"secret","msg_type":"set_creds"}"#)
            .await;

        assert!(h.wifi.applied_credentials().await.is_empty());
        assert_eq!(h.callback_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_apply_skips_callback() {
        let mut h = Harness::new().await;
        h.wifi.set_apply_failure(true).await;
        h.deliver(r#"{"msg_type":"set_creds","ssid":"Home","password":"secret"}"#)
            .await;

        assert_eq!(h.callback_count(), 0);
        assert_eq!(h.machine.stats().credentials_applied, 0);
    }

    #[tokio::test]
    async fn test_unknown_msg_type_is_ignored() {
        let mut h = Harness::new().await;
        h.deliver(r#"{"msg_type":"reboot","ssid":"Home","password":"secret"}"#)
            .await;
        h.deliver(r#"{"msg_type":42}"#).await;
        h.deliver(r#"{"hello":"world"}"#).await;

        assert_eq!(h.wifi.scan_requests().await, 0);
        assert!(h.wifi.applied_credentials().await.is_empty());
        assert_eq!(h.callback_count(), 0);
        assert_eq!(h.machine.stats().ignored_messages, 3);
    }

    #[tokio::test]
    async fn test_malformed_message_is_released() {
        let mut h = Harness::new().await;
        h.deliver("{bad json").await;
        h.deliver("\u{1F600}").await;

        assert_eq!(h.machine.inbound_stats().pushed(), 2);
        assert_eq!(h.machine.inbound_stats().popped(), 2);
        assert_eq!(h.machine.stats().malformed_messages, 2);
        assert_eq!(h.wifi.scan_requests().await, 0);
        assert!(h.wifi.applied_credentials().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_malformed() {
        let mut h = Harness::new().await;
        h.sender.push_frame(&[0xff, 0xfe, 0x7b]).unwrap();
        h.machine.run_cycle().await;
        h.machine.run_cycle().await;

        assert_eq!(h.machine.stats().malformed_messages, 1);
        assert_eq!(h.machine.inbound_stats().depth(), 0);
    }

    #[tokio::test]
    async fn test_scan_results_streamed_in_order() {
        let mut h = Harness::new().await;
        h.wifi
            .set_scan_results(vec![
                AccessPointRecord::new("Net1", SecurityKind::Wpa2, 6, -50),
                AccessPointRecord::new("Net2", SecurityKind::Open, 11, -70),
            ])
            .await;

        h.deliver(r#"{"msg_type":"scan"}"#).await;
        assert_eq!(h.wifi.scan_requests().await, 1);
        assert_eq!(h.machine.stats().scans_requested, 1);
        assert!(h.radio.sent_frames().await.is_empty());

        h.wifi.complete_scans().await;
        h.machine.run_cycle().await;

        assert_eq!(
            h.radio.sent_frames().await,
            vec![
                r#"{"msg_t":"scan_resp", "ssid":"Net1", "sec":"WPA2", "ch":6, "rssi":-50}"#,
                r#"{"msg_t":"scan_resp", "ssid":"Net2", "sec":"Unsecured", "ch":11, "rssi":-70}"#,
            ]
        );
        assert_eq!(h.machine.stats().frames_sent, 2);

        // Each record goes out exactly once
        h.machine.run_cycle().await;
        assert_eq!(h.radio.sent_frames().await.len(), 2);
    }

    #[tokio::test]
    async fn test_scan_results_not_starved_by_backlog() {
        let mut h = Harness::new().await;
        for _ in 0..3 {
            h.sender.push_frame(br#"{"msg_type":"noop"}"#).unwrap();
        }

        let sink = h.machine.scan_result_sink();
        for i in 0..5 {
            assert!(sink.push(AccessPointRecord::new(
                format!("Net{i}"),
                SecurityKind::Wpa,
                1,
                -40
            )));
        }

        h.machine.run_cycle().await;
        assert_eq!(h.radio.sent_frames().await.len(), 5);
        assert_eq!(h.machine.inbound_stats().depth(), 3);
        assert_eq!(h.machine.scan_result_stats().depth(), 0);
    }

    #[tokio::test]
    async fn test_unknown_security_renders_fallback() {
        let mut h = Harness::new().await;
        h.machine
            .scan_result_sink()
            .push(AccessPointRecord::from_raw("Odd", 9, 3, -80));

        h.machine.run_cycle().await;
        assert_eq!(
            h.radio.sent_frames().await,
            vec![r#"{"msg_t":"scan_resp", "ssid":"Odd", "sec":"Unknown", "ch":3, "rssi":-80}"#]
        );
    }

    #[tokio::test]
    async fn test_transmit_failure_keeps_draining() {
        let mut h = Harness::new().await;
        h.radio.fail_after(1).await;

        let sink = h.machine.scan_result_sink();
        for name in ["A", "B", "C"] {
            sink.push(AccessPointRecord::new(name, SecurityKind::Wep, 1, -60));
        }

        h.machine.run_cycle().await;
        assert_eq!(h.radio.attempts().await, 3);
        assert_eq!(h.radio.sent_frames().await.len(), 1);
        assert_eq!(h.machine.stats().frames_sent, 1);
        assert_eq!(h.machine.stats().frames_failed, 2);
        assert_eq!(h.machine.scan_result_stats().depth(), 0);
    }

    #[tokio::test]
    async fn test_scan_request_failure_is_contained() {
        let mut h = Harness::new().await;
        h.wifi.set_scan_failure(true).await;
        h.deliver(r#"{"msg_type":"scan"}"#).await;

        assert_eq!(h.machine.stats().scans_requested, 0);
        assert_eq!(h.machine.state(), ConfigState::Idle);
    }

    #[tokio::test]
    async fn test_callback_settable_once() {
        let mut h = Harness::new().await;
        let result = h.machine.set_provision_callback(|| {});
        assert!(matches!(result, Err(ServiceError::CallbackAlreadySet)));
    }

    #[tokio::test]
    async fn test_no_callback_registered() {
        let (sender, inbound) = InboundQueue::channel();
        let wifi = MockWifiBackend::new();
        let mut machine = ProvisioningStateMachine::new(
            Arc::new(wifi.clone()),
            Arc::new(MockRadio::new()),
            inbound,
        );

        sender
            .push_frame(br#"{"msg_type":"set_creds","ssid":"Home","password":"secret"}"#)
            .unwrap();
        for _ in 0..3 {
            machine.run_cycle().await;
        }

        assert_eq!(wifi.applied_credentials().await.len(), 1);
        assert_eq!(machine.stats().credentials_applied, 1);
    }
}
