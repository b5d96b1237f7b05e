//! Domain types for BLE WiFi provisioning

use serde::{Deserialize, Serialize};

/// Label rendered for an access point whose security classification is unknown
pub const UNKNOWN_SECURITY_LABEL: &str = "Unknown";

/// Access point security classification
///
/// The ordinals are fixed and shared with the WiFi subsystem's classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SecurityKind {
    Open = 0,
    Wep = 1,
    Wpa = 2,
    Wpa2 = 3,
    WpaEnterprise = 4,
    Wpa2Enterprise = 5,
}

impl SecurityKind {
    /// Display label used in scan responses
    pub fn label(self) -> &'static str {
        match self {
            SecurityKind::Open => "Unsecured",
            SecurityKind::Wep => "WEP",
            SecurityKind::Wpa => "WPA",
            SecurityKind::Wpa2 => "WPA2",
            SecurityKind::WpaEnterprise => "WPA Enterprise",
            SecurityKind::Wpa2Enterprise => "WPA2 Enterprise",
        }
    }

    /// Map a wpa_supplicant flags column (e.g. `[WPA2-PSK-CCMP][ESS]`)
    pub fn from_flags(flags: &str) -> Self {
        let enterprise = flags.contains("-EAP");
        if flags.contains("WPA2-") || flags.contains("RSN-") {
            if enterprise {
                SecurityKind::Wpa2Enterprise
            } else {
                SecurityKind::Wpa2
            }
        } else if flags.contains("WPA-") {
            if enterprise {
                SecurityKind::WpaEnterprise
            } else {
                SecurityKind::Wpa
            }
        } else if flags.contains("WEP") {
            SecurityKind::Wep
        } else {
            SecurityKind::Open
        }
    }
}

impl TryFrom<u8> for SecurityKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            0 => Ok(SecurityKind::Open),
            1 => Ok(SecurityKind::Wep),
            2 => Ok(SecurityKind::Wpa),
            3 => Ok(SecurityKind::Wpa2),
            4 => Ok(SecurityKind::WpaEnterprise),
            5 => Ok(SecurityKind::Wpa2Enterprise),
            _ => Err(()),
        }
    }
}

impl From<SecurityKind> for u8 {
    fn from(kind: SecurityKind) -> Self {
        kind as u8
    }
}

/// One access point discovered by a WiFi scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessPointRecord {
    /// Network SSID (untrusted, may exceed 32 bytes)
    pub ssid: String,
    /// Security classification, `None` when the platform reported an unknown kind
    pub security: Option<SecurityKind>,
    /// Channel number
    pub channel: u16,
    /// Signal strength in dBm
    pub rssi: i16,
}

impl AccessPointRecord {
    pub fn new(ssid: impl Into<String>, security: SecurityKind, channel: u16, rssi: i16) -> Self {
        Self {
            ssid: ssid.into(),
            security: Some(security),
            channel,
            rssi,
        }
    }

    /// Build a record from a raw platform security ordinal
    ///
    /// Ordinals outside the known set are kept as an unknown classification.
    pub fn from_raw(ssid: impl Into<String>, security: u8, channel: u16, rssi: i16) -> Self {
        Self {
            ssid: ssid.into(),
            security: SecurityKind::try_from(security).ok(),
            channel,
            rssi,
        }
    }

    /// Label for the record's security classification
    pub fn security_label(&self) -> &'static str {
        self.security.map_or(UNKNOWN_SECURITY_LABEL, SecurityKind::label)
    }
}

/// Provisioning state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ConfigState {
    Setup = 0,
    Idle = 1,
    ParseMessage = 2,
}

impl From<ConfigState> for u8 {
    fn from(state: ConfigState) -> Self {
        state as u8
    }
}

impl std::fmt::Display for ConfigState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConfigState::Setup => "setup",
            ConfigState::Idle => "idle",
            ConfigState::ParseMessage => "parse_message",
        };
        f.write_str(name)
    }
}
