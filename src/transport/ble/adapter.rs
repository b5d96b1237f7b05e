//! BLE adapter management

use bluer::{
    Adapter, AdapterEvent,
    adv::{Advertisement, AdvertisementHandle, Type},
    gatt::local::ApplicationHandle,
};
use futures::StreamExt;
use tracing::{debug, info, trace, warn};

use super::{gatt::GattServer, uuids::PROVISIONING_SERVICE_UUID};

/// BLE transport adapter
pub struct BleAdapter {
    adapter: Adapter,
    device_name: String,
    // Dropping these unregisters the service and stops advertising
    app_handle: Option<ApplicationHandle>,
    adv_handle: Option<AdvertisementHandle>,
}

impl BleAdapter {
    /// Open the default adapter of the local BlueZ daemon
    pub async fn new(device_name: String) -> Result<Self, bluer::Error> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;

        info!("Using BLE adapter: {}", adapter.name());

        Ok(Self {
            adapter,
            device_name,
            app_handle: None,
            adv_handle: None,
        })
    }

    /// Power the adapter, serve the GATT application and start advertising
    pub async fn start(&mut self, gatt_server: &GattServer) -> Result<(), bluer::Error> {
        info!("Starting BLE adapter");

        self.adapter.set_powered(true).await?;
        self.adapter.set_alias(self.device_name.clone()).await?;

        self.app_handle = Some(gatt_server.register(&self.adapter).await?);

        // Companion apps filter on the service UUID
        let advertisement = Advertisement {
            advertisement_type: Type::Peripheral,
            service_uuids: [PROVISIONING_SERVICE_UUID].into_iter().collect(),
            local_name: Some(self.device_name.clone()),
            discoverable: Some(true),
            ..Default::default()
        };
        self.adv_handle = Some(self.adapter.advertise(advertisement).await?);

        let address = self.adapter.address().await?;
        trace!("Bluetooth address: {}", address);
        info!("Advertising as '{}' ({})", self.device_name, address);

        Ok(())
    }

    /// Stop advertising and unregister the GATT application
    pub async fn stop(&mut self) {
        info!("Stopping BLE adapter");
        self.adv_handle.take();
        self.app_handle.take();
        info!("BLE adapter stopped");
    }

    /// Run event loop (log peer devices coming and going)
    pub async fn run_event_loop(&self) -> Result<(), bluer::Error> {
        let mut events = self.adapter.events().await?;

        info!("BLE event loop started");

        while let Some(event) = events.next().await {
            match event {
                AdapterEvent::DeviceAdded(addr) => {
                    debug!("Device added: {}", addr);
                }
                AdapterEvent::DeviceRemoved(addr) => {
                    debug!("Device removed: {}", addr);
                }
                AdapterEvent::PropertyChanged(prop) => {
                    trace!("Adapter property changed: {:?}", prop);
                }
            }
        }

        warn!("BLE event loop ended");
        Ok(())
    }
}
