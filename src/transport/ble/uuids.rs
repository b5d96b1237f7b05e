//! BLE GATT UUIDs
//!
//! The layout follows the Nordic UART service, which web and mobile BLE
//! tooling already understands: one write characteristic for the peer and
//! one notify characteristic for the device.

use uuid::Uuid;

/// Provisioning service UUID, also carried in the advertisement
pub const PROVISIONING_SERVICE_UUID: Uuid = Uuid::from_bytes([
    0x6e, 0x40, 0x00, 0x01, 0xb5, 0xa3, 0xf3, 0x93, 0xe0, 0xa9, 0xe5, 0x0e, 0x24, 0xdc, 0xca, 0x9e,
]);

/// Peer to device characteristic (write without response)
pub const TX_CHAR_UUID: Uuid = Uuid::from_bytes([
    0x6e, 0x40, 0x00, 0x02, 0xb5, 0xa3, 0xf3, 0x93, 0xe0, 0xa9, 0xe5, 0x0e, 0x24, 0xdc, 0xca, 0x9e,
]);

/// Device to peer characteristic (notify)
pub const RX_CHAR_UUID: Uuid = Uuid::from_bytes([
    0x6e, 0x40, 0x00, 0x03, 0xb5, 0xa3, 0xf3, 0x93, 0xe0, 0xa9, 0xe5, 0x0e, 0x24, 0xdc, 0xca, 0x9e,
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_format() {
        assert_eq!(
            PROVISIONING_SERVICE_UUID.to_string(),
            "6e400001-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            TX_CHAR_UUID.to_string(),
            "6e400002-b5a3-f393-e0a9-e50e24dcca9e"
        );
        assert_eq!(
            RX_CHAR_UUID.to_string(),
            "6e400003-b5a3-f393-e0a9-e50e24dcca9e"
        );
    }

    #[test]
    fn test_uuids_unique() {
        assert_ne!(PROVISIONING_SERVICE_UUID, TX_CHAR_UUID);
        assert_ne!(PROVISIONING_SERVICE_UUID, RX_CHAR_UUID);
        assert_ne!(TX_CHAR_UUID, RX_CHAR_UUID);
    }
}
