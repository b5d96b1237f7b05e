//! BLE WiFi Setup
//!
//! Lets a headless device accept WiFi credentials from a companion app over
//! Bluetooth Low Energy. The app writes JSON commands to a GATT characteristic;
//! the device answers scan requests with one JSON notification per access point
//! and hands received credentials to wpa_supplicant.

pub mod backend;
pub mod config;
pub mod core;
pub mod protocol;
pub mod transport;

pub use core::{
    error::{ServiceError, TransportError, WifiError},
    machine::{CycleStats, ProvisioningStateMachine},
    queue::{InboundMessage, InboundQueue, InboundSender, ScanResultQueue, ScanResultSink},
    types::{AccessPointRecord, ConfigState, SecurityKind},
};
