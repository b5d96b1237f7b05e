//! Peer-to-device command decoding
//!
//! Messages are JSON objects keyed by `msg_type`:
//!
//! ```text
//! {"msg_type":"scan"}
//! {"msg_type":"set_creds", "ssid":"<string>", "password":"<string>"}
//! ```
//!
//! Keys are visited in document order. Credential fields only count when they
//! follow `msg_type` at the same level.

use std::{fmt, str::Utf8Error};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::core::queue::InboundMessage;

pub const MSG_TYPE_KEY: &str = "msg_type";
pub const SCAN_MSG_TYPE: &str = "scan";
pub const SET_CREDS_MSG_TYPE: &str = "set_creds";

const SSID_KEY: &str = "ssid";
const PASSWORD_KEY: &str = "password";

/// A decoded, validated command from the peer
#[derive(Debug, PartialEq, Eq)]
pub enum ProvisioningCommand {
    /// Start an asynchronous WiFi scan
    ScanRequest,

    /// Apply WiFi credentials
    SetCredentials(Credentials),
}

/// WiFi credentials received from the peer, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    ssid: String,
    password: String,
}

impl Credentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ssid", &self.ssid)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Reasons a message produced no command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Message is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] Utf8Error),

    #[error("Message is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Message has no msg_type")]
    MissingMessageType,

    #[error("Unrecognized msg_type: {0}")]
    UnknownMessageType(String),

    #[error("Incomplete credentials: missing or empty {0}")]
    IncompleteCredentials(&'static str),
}

impl CommandError {
    /// The message could not be decoded at all
    pub fn is_malformed(&self) -> bool {
        matches!(self, CommandError::InvalidUtf8(_) | CommandError::Malformed(_))
    }

    /// A recognized command was missing required fields
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandError::IncompleteCredentials(_))
    }
}

/// Decode one inbound message
pub fn decode_message(message: &InboundMessage) -> Result<ProvisioningCommand, CommandError> {
    decode_command(message.text()?)
}

/// Decode the text of one message into a command
pub fn decode_command(text: &str) -> Result<ProvisioningCommand, CommandError> {
    let document: Value = serde_json::from_str(text)?;

    // Anything but an object has no keys to act on
    let Value::Object(fields) = document else {
        return Err(CommandError::MissingMessageType);
    };

    let mut fields = fields.into_iter();
    let msg_type = loop {
        let Some((key, value)) = fields.next() else {
            return Err(CommandError::MissingMessageType);
        };
        if key == MSG_TYPE_KEY {
            break value;
        }
        info!(%key, kind = json_kind(&value), "Ignoring top-level key");
    };

    match msg_type.as_str() {
        Some(SCAN_MSG_TYPE) => {
            info!("msg_type=scan");
            log_ignored_keys(fields);
            Ok(ProvisioningCommand::ScanRequest)
        }
        Some(SET_CREDS_MSG_TYPE) => {
            info!("msg_type=set_creds");
            decode_credentials(fields).map(ProvisioningCommand::SetCredentials)
        }
        Some(other) => {
            log_ignored_keys(fields);
            Err(CommandError::UnknownMessageType(other.to_string()))
        }
        None => {
            log_ignored_keys(fields);
            Err(CommandError::UnknownMessageType(format!(
                "<{}>",
                json_kind(&msg_type)
            )))
        }
    }
}

fn log_ignored_keys(fields: impl Iterator<Item = (String, Value)>) {
    // Values are never logged, they may carry credentials
    for (key, value) in fields {
        info!(%key, kind = json_kind(&value), "Ignoring top-level key");
    }
}

fn decode_credentials(
    fields: impl Iterator<Item = (String, Value)>,
) -> Result<Credentials, CommandError> {
    let mut ssid = None;
    let mut password = None;

    for (key, value) in fields {
        match key.as_str() {
            SSID_KEY => {
                ssid = string_field(key.as_str(), value);
                info!(ssid = ?ssid, "Set WiFi SSID");
            }
            PASSWORD_KEY => {
                password = string_field(key.as_str(), value);
                info!(len = password.as_ref().map_or(0, String::len), "Set WiFi password");
            }
            _ => warn!(%key, "Unrecognized key while parsing WiFi credentials"),
        }
    }

    let Some(ssid) = ssid.filter(|s| !s.is_empty()) else {
        return Err(CommandError::IncompleteCredentials(SSID_KEY));
    };
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Err(CommandError::IncompleteCredentials(PASSWORD_KEY));
    };

    Ok(Credentials { ssid, password })
}

fn string_field(key: &str, value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        other => {
            debug!(key, kind = json_kind(&other), "Credential field is not a string");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
