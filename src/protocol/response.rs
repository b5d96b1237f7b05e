//! Device-to-peer scan response frames
//!
//! Each discovered access point is sent as one single-line record:
//!
//! ```text
//! {"msg_t":"scan_resp", "ssid":"Net1", "sec":"WPA2", "ch":6, "rssi":-50}
//! ```

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use tracing::debug;

use crate::core::{
    error::{TransportError, TransportResult},
    types::AccessPointRecord,
};

/// Longest SSID the frame accounts for (IEEE 802.11)
pub const MAX_SSID_LEN: usize = 32;

pub const SCAN_RESPONSE_MSG_TYPE: &str = "scan_resp";

// JSON escaping expands a control byte to at most six (`\u00XX`), plus quotes
const MAX_ESCAPED_SSID_LEN: usize = MAX_SSID_LEN * 6 + 2;
const MAX_SECURITY_LABEL_LEN: usize = "WPA2 Enterprise".len();
const MAX_CHANNEL_LEN: usize = "65535".len();
const MAX_RSSI_LEN: usize = "-32768".len();
const FRAME_SKELETON: &str = r#"{"msg_t":"scan_resp", "ssid":, "sec":"", "ch":, "rssi":}"#;

/// Upper bound for one encoded scan response frame
pub const SCAN_FRAME_CAPACITY: usize = FRAME_SKELETON.len()
    + MAX_ESCAPED_SSID_LEN
    + MAX_SECURITY_LABEL_LEN
    + MAX_CHANNEL_LEN
    + MAX_RSSI_LEN;

/// Scan response record as sent to the peer
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScanResponse<'a> {
    #[serde(rename = "msg_t")]
    pub msg_type: &'static str,
    pub ssid: &'a str,
    #[serde(rename = "sec")]
    pub security: &'static str,
    #[serde(rename = "ch")]
    pub channel: u16,
    pub rssi: i16,
}

impl<'a> ScanResponse<'a> {
    /// Borrow a record, truncating its SSID to [`MAX_SSID_LEN`] bytes
    pub fn from_record(record: &'a AccessPointRecord) -> Self {
        Self {
            msg_type: SCAN_RESPONSE_MSG_TYPE,
            ssid: truncate_ssid(&record.ssid),
            security: record.security_label(),
            channel: record.channel,
            rssi: record.rssi,
        }
    }

    /// Encode as one wire frame
    pub fn encode(&self) -> TransportResult<Vec<u8>> {
        let mut frame = Vec::with_capacity(SCAN_FRAME_CAPACITY);
        let mut serializer = Serializer::with_formatter(&mut frame, WireFormatter);
        self.serialize(&mut serializer)?;

        if frame.len() > SCAN_FRAME_CAPACITY {
            return Err(TransportError::FrameTooLarge {
                len: frame.len(),
                capacity: SCAN_FRAME_CAPACITY,
            });
        }
        Ok(frame)
    }
}

/// Encode one access point record as a scan response frame
pub fn encode_scan_response(record: &AccessPointRecord) -> TransportResult<Vec<u8>> {
    ScanResponse::from_record(record).encode()
}

fn truncate_ssid(ssid: &str) -> &str {
    if ssid.len() <= MAX_SSID_LEN {
        return ssid;
    }
    let mut end = MAX_SSID_LEN;
    while !ssid.is_char_boundary(end) {
        end -= 1;
    }
    debug!(len = ssid.len(), kept = end, "Truncating oversized SSID");
    &ssid[..end]
}

/// Compact JSON with `", "` between object members, as companion apps expect
struct WireFormatter;

impl Formatter for WireFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}
