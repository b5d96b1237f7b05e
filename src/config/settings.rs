//! Runtime settings

use std::{path::Path, time::Duration};

use crate::config::CliArgs;

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub device_name: String,
    pub cycle_interval: Duration,
    /// Control socket of the interface's wpa_supplicant instance
    pub wpa_socket_path: String,
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        // A zero period would make the cycle loop spin
        let cycle_interval = Duration::from_millis(args.cycle_interval_ms.max(1));

        let wpa_socket_path = Path::new(&args.socket_dir)
            .join(&args.interface)
            .to_string_lossy()
            .into_owned();

        Settings {
            interface: args.interface,
            device_name: args.device_name,
            cycle_interval,
            wpa_socket_path,
        }
    }
}
