//! Wire protocol between the companion app and the device

pub mod request;
pub mod response;

pub use {
    request::{CommandError, Credentials, ProvisioningCommand, decode_command, decode_message},
    response::{SCAN_FRAME_CAPACITY, ScanResponse, encode_scan_response},
};
