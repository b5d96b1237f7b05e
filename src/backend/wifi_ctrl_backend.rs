//! wifi-ctrl (wpa_supplicant) backend implementation

use tracing::{debug, error, warn};
use wifi_ctrl::sta::{BroadcastReceiver, RequestClient, WifiSetup};

use crate::{
    backend::WifiBackend,
    core::{
        error::{WifiError, WifiResult},
        queue::ScanResultSink,
        types::{AccessPointRecord, SecurityKind},
    },
};

pub struct WifiCtrlBackend {
    socket_path: String,
    client: RequestClient,
    // The station runtime exits once its broadcast channel has no subscriber
    _broadcast_receiver: BroadcastReceiver,
}

impl WifiCtrlBackend {
    /// Connect to the wpa_supplicant control socket at `socket_path`
    ///
    /// Spawns the wifi-ctrl station runtime on the current tokio runtime.
    pub fn new(socket_path: String) -> WifiResult<Self> {
        let mut setup =
            WifiSetup::new().map_err(|e| WifiError::WpaSupplicantError(e.to_string()))?;
        setup.set_socket_path(socket_path.clone());

        let client = setup.get_request_client();
        let broadcast_receiver = setup.get_broadcast_receiver();
        let station = setup.complete();

        tokio::spawn(async move {
            if let Err(e) = station.run().await {
                error!("WifiStation runtime error: {}", e);
            }
        });

        Ok(Self {
            socket_path,
            client,
            _broadcast_receiver: broadcast_receiver,
        })
    }

    /// Convert a frequency in MHz to its channel number, 0 when unknown
    fn frequency_to_channel(freq_str: &str) -> u16 {
        let Ok(freq) = freq_str.parse::<u16>() else {
            return 0;
        };
        match freq {
            2484 => 14,
            2412..=2472 => (freq - 2407) / 5,
            5160..=5885 => (freq - 5000) / 5,
            5955..=7115 => (freq - 5950) / 5,
            _ => 0,
        }
    }
}

impl WifiBackend for WifiCtrlBackend {
    async fn request_scan(&self, results: ScanResultSink) -> WifiResult<()> {
        debug!("Requesting WiFi scan via {}", self.socket_path);

        // The scan can take seconds, run it off the provisioning cycle
        let client = self.client.clone();
        tokio::spawn(async move {
            let scan = match client.get_scan().await {
                Ok(scan) => scan,
                Err(e) => {
                    warn!("WiFi scan failed: {}", e);
                    return;
                }
            };

            let mut reported = 0usize;
            for res in scan.iter() {
                let record = AccessPointRecord::new(
                    res.name.clone(),
                    SecurityKind::from_flags(&res.flags),
                    Self::frequency_to_channel(&res.frequency),
                    res.signal.clamp(i16::MIN as isize, i16::MAX as isize) as i16,
                );
                if !results.push(record) {
                    break;
                }
                reported += 1;
            }
            debug!("Scan complete, reported {} access points", reported);
        });

        Ok(())
    }

    async fn apply_credentials(&self, ssid: &str, password: &str) -> WifiResult<()> {
        debug!("Storing credentials for network: {}", ssid);

        // Both values travel inside a single line control command
        if ssid.chars().chain(password.chars()).any(char::is_control) {
            return Err(WifiError::CredentialsRejected(
                "Credentials contain control characters".into(),
            ));
        }

        let network_id =
            self.client.add_network().await.map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to add network: {}", e))
            })?;

        self.client
            .set_network_ssid(network_id, ssid.to_string())
            .await
            .map_err(|e| WifiError::CredentialsRejected(format!("Failed to set SSID: {}", e)))?;

        // wifi-ctrl quotes ssid and psk values itself
        self.client
            .set_network_psk(network_id, password.to_string())
            .await
            .map_err(|e| {
                WifiError::CredentialsRejected(format!("Failed to set passphrase: {}", e))
            })?;

        // Enable rather than select, selecting would drop the current association
        let reply = self
            .client
            .send_custom(format!("ENABLE_NETWORK {}", network_id))
            .await
            .map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to enable network: {}", e))
            })?;
        if reply.trim() != "OK" {
            return Err(WifiError::CredentialsRejected(format!(
                "wpa_supplicant refused to enable network {}: {}",
                network_id,
                reply.trim()
            )));
        }

        if let Err(e) = self.client.save_config().await {
            warn!("Failed to save wpa_supplicant config: {}", e);
        }

        debug!("Credentials stored as network {}", network_id);
        Ok(())
    }
}
