//! Bluetooth Low Energy transport layer

pub mod adapter;
pub mod characteristics;
pub mod gatt;
pub mod radio;
pub mod uuids;

pub use {
    adapter::BleAdapter, characteristics::CharacteristicHandler, gatt::GattServer,
    radio::BleRadio, uuids::*,
};
