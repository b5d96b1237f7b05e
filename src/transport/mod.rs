//! Radio transport layer

pub mod ble;
pub mod mock_radio;
pub mod radio;

pub use {ble::BleRadio, radio::RadioTransport};

#[cfg(test)]
pub use mock_radio::MockRadio;
