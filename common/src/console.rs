// Operator-visible console output and the welcome banner

use crate::config::DeviceConfig;

/// Line-oriented console sink
pub trait Console: Send + Sync {
    fn print(&self, line: &str);
}

/// Console writing to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn print(&self, line: &str) {
        println!("{}", line);
    }
}

/// Lines printed once at startup
pub fn banner(device: &DeviceConfig, endpoint_url: &str, interval_ms: u64) -> Vec<String> {
    vec![
        format!(
            "This is {} {} ({})",
            device.name, device.fw_version, device.arch
        ),
        format!(
            "Sending random sensor data to {} every {} ms once the transport is ready.",
            endpoint_url, interval_ms
        ),
    ]
}
