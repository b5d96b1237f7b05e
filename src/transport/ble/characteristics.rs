//! BLE characteristic handlers

use bluer::gatt::local::{CharacteristicNotifier, ReqError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::core::queue::InboundSender;

use super::radio::BleRadio;

/// Notification session of the currently subscribed peer, if any
pub(crate) type NotifierSlot = Arc<Mutex<Option<CharacteristicNotifier>>>;

/// Characteristic handler for the provisioning service
pub struct CharacteristicHandler {
    inbound: InboundSender,
    notifier: NotifierSlot,
}

impl CharacteristicHandler {
    /// Create a handler that queues peer writes into `inbound`
    pub fn new(inbound: InboundSender) -> Self {
        Self {
            inbound,
            notifier: Arc::new(Mutex::new(None)),
        }
    }

    /// Radio handle that notifies through this handler's subscriber
    pub fn radio(&self) -> BleRadio {
        BleRadio::new(self.notifier.clone())
    }

    /// Handle a write on the tx characteristic
    pub async fn handle_tx_write(&self, value: Vec<u8>) -> Result<(), ReqError> {
        debug!("tx write received ({} bytes)", value.len());

        self.inbound.push_frame(&value).map_err(|e| {
            error!("Failed to queue inbound frame: {}", e);
            ReqError::Failed
        })
    }

    /// Handle a peer subscribing to the rx characteristic
    pub async fn handle_rx_subscribe(&self, notifier: CharacteristicNotifier) {
        info!("Peer subscribed to scan results");
        if self.notifier.lock().await.replace(notifier).is_some() {
            debug!("Replaced previous notification session");
        }
    }
}
