//! BLE WiFi Setup - Main Entry Point

use std::{sync::Arc, time::Duration};

use ble_wifi_setup::{
    InboundQueue, ProvisioningStateMachine,
    backend::{WifiBackend, WifiCtrlBackend},
    config::{CliArgs, Settings},
    transport::{
        RadioTransport,
        ble::{BleAdapter, CharacteristicHandler, GattServer},
    },
};
use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ble_wifi_setup=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let args = CliArgs::parse();
    info!(?args, "Starting BLE WiFi setup");
    let settings = Settings::from(args);

    // WiFi must be reachable for provisioning to make sense
    let backend = Arc::new(WifiCtrlBackend::new(settings.wpa_socket_path.clone())?);
    info!(
        "WiFi backend initialized for interface: {}",
        settings.interface
    );

    // Radio receive path feeds the machine's inbound queue
    let (inbound_sender, inbound) = InboundQueue::channel();
    let handler = Arc::new(CharacteristicHandler::new(inbound_sender));
    let radio = Arc::new(handler.radio());

    let mut machine = ProvisioningStateMachine::new(backend, radio, inbound);
    machine.set_provision_callback(|| info!("Device provisioned"))?;

    let mut adapter = BleAdapter::new(settings.device_name.clone()).await?;
    adapter.start(&GattServer::new(handler)).await?;

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        error!("Failed to notify systemd: {}", e);
    }

    info!("Service started successfully");

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
        result = adapter.run_event_loop() => {
            if let Err(e) = result {
                error!("BLE adapter error: {}", e);
            }
        }
        _ = run_state_machine(&mut machine, settings.cycle_interval) => {}
    }

    info!("Shutting down...");
    adapter.stop().await;
    info!(stats = ?machine.stats(), "Provisioning statistics");
    Ok(())
}

/// Drive the state machine at a fixed period
async fn run_state_machine<W: WifiBackend, R: RadioTransport>(
    machine: &mut ProvisioningStateMachine<W, R>,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        machine.run_cycle().await;
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    // On non-Unix platforms, just wait forever
    std::future::pending::<()>().await
}
