//! Error types for the BLE WiFi setup manager

use thiserror::Error;

/// Result type for WiFi backend operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for radio transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors related to WiFi backend operations
#[derive(Error, Debug, Clone)]
pub enum WifiError {
    #[error("WiFi scan failed: {0}")]
    ScanFailed(String),

    #[error("Failed to apply credentials: {0}")]
    CredentialsRejected(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("wpa_supplicant error: {0}")]
    WpaSupplicantError(String),
}

/// Errors related to setting up and running the provisioning service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Provisioning callback already registered")]
    CallbackAlreadySet,

    #[error("Backend error: {0}")]
    Backend(#[from] WifiError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors related to the radio transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("BLE error: {0}")]
    Ble(#[from] bluer::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Frame too large: {len} bytes exceeds capacity of {capacity}")]
    FrameTooLarge { len: usize, capacity: usize },

    #[error("Notification failed: {0}")]
    NotifyFailed(String),

    #[error("Session closed")]
    SessionClosed,
}
