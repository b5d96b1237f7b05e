//! BLE implementation of the radio transport port

use tracing::{debug, trace};

use crate::{
    core::error::{TransportError, TransportResult},
    transport::RadioTransport,
};

use super::characteristics::NotifierSlot;

/// Sends frames as notifications on the rx characteristic
#[derive(Clone)]
pub struct BleRadio {
    notifier: NotifierSlot,
}

impl BleRadio {
    pub(crate) fn new(notifier: NotifierSlot) -> Self {
        Self { notifier }
    }

    /// Whether a peer is currently subscribed
    pub async fn has_subscriber(&self) -> bool {
        self.notifier
            .lock()
            .await
            .as_ref()
            .is_some_and(|n| !n.is_stopped())
    }
}

impl RadioTransport for BleRadio {
    async fn send(&self, frame: &[u8]) -> TransportResult<()> {
        let mut slot = self.notifier.lock().await;

        if slot.as_ref().is_some_and(|n| n.is_stopped()) {
            debug!("Notification session ended");
            *slot = None;
        }

        let Some(notifier) = slot.as_mut() else {
            debug!("No subscriber, dropping {} byte frame", frame.len());
            return Ok(());
        };

        trace!(len = frame.len(), "Sending notification");
        notifier
            .notify(frame.to_vec())
            .await
            .map_err(|e| TransportError::NotifyFailed(e.to_string()))
    }
}
