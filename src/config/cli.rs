//! Command-line argument parsing

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(name = "ble-wifi-setup", version, author)]
#[clap(about = "Provision WiFi credentials over a BLE JSON message link")]
pub struct CliArgs {
    /// Wireless network interface name
    #[clap(short, long, default_value = "wlan0")]
    pub interface: String,

    /// Name advertised to companion apps
    #[clap(short, long, default_value = "WiFi-Setup")]
    pub device_name: String,

    /// Delay between state machine cycles in milliseconds
    #[clap(long, default_value_t = 50)]
    pub cycle_interval_ms: u64,

    /// Directory holding the wpa_supplicant control sockets
    #[clap(long, default_value = "/var/run/wpa_supplicant")]
    pub socket_dir: String,
}
