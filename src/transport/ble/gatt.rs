//! GATT server implementation

use bluer::{
    Adapter,
    gatt::local::{
        Application, ApplicationHandle, Characteristic, CharacteristicNotify,
        CharacteristicNotifyMethod, CharacteristicWrite, CharacteristicWriteMethod, Service,
    },
};
use std::sync::Arc;
use tracing::info;

use super::{characteristics::CharacteristicHandler, uuids::*};

/// GATT server exposing the provisioning service
pub struct GattServer {
    handler: Arc<CharacteristicHandler>,
}

impl GattServer {
    pub fn new(handler: Arc<CharacteristicHandler>) -> Self {
        Self { handler }
    }

    /// Build the GATT application
    pub fn build_application(&self) -> Application {
        Application {
            services: vec![self.build_provisioning_service()],
            ..Default::default()
        }
    }

    fn build_provisioning_service(&self) -> Service {
        Service {
            uuid: PROVISIONING_SERVICE_UUID,
            primary: true,
            characteristics: vec![
                // rx: device to peer
                Characteristic {
                    uuid: RX_CHAR_UUID,
                    notify: Some(CharacteristicNotify {
                        notify: true,
                        method: CharacteristicNotifyMethod::Fun({
                            let handler = self.handler.clone();
                            Box::new(move |notifier| {
                                let handler = handler.clone();
                                Box::pin(async move { handler.handle_rx_subscribe(notifier).await })
                            })
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
                // tx: peer to device
                Characteristic {
                    uuid: TX_CHAR_UUID,
                    write: Some(CharacteristicWrite {
                        write: false,
                        write_without_response: true,
                        method: CharacteristicWriteMethod::Fun({
                            let handler = self.handler.clone();
                            Box::new(move |new_value, _req| {
                                let handler = handler.clone();
                                Box::pin(async move { handler.handle_tx_write(new_value).await })
                            })
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    /// Register the GATT application with the adapter
    ///
    /// The application stays registered for as long as the returned handle lives.
    pub async fn register(&self, adapter: &Adapter) -> Result<ApplicationHandle, bluer::Error> {
        info!("Registering GATT application");
        let handle = adapter
            .serve_gatt_application(self.build_application())
            .await?;
        info!("GATT application registered");
        Ok(handle)
    }
}
