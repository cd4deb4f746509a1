//! Bridge pipelines and supervision
//!
//! Two independent directional pipelines, telemetry (serial to TCP) and
//! commands (TCP to serial), run on their own threads under a supervisor that
//! restarts both together whenever either one fails.

pub mod command;
mod control;
mod link;
mod supervisor;
pub mod telemetry;

pub use control::Control;
pub use supervisor::Supervisor;
pub use telemetry::ConsumePolicy;

use std::time::Duration;

use crate::protocol::DEFAULT_BAUD_RATE;

/// Default flight data port device
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyACM0";

/// Ground-station telemetry port (server sends, never expects replies)
pub const TELEMETRY_PORT: u16 = 2950;

/// Ground-station command port (server only receives)
pub const COMMAND_PORT: u16 = 2951;

/// Maximum bytes accepted from the command client per read
pub const MAX_COMMAND_READ: usize = 257;

/// Fixed backoff between serial connect attempts
pub const SERIAL_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Yield between polls when no input is pending
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Yield between accept attempts while awaiting a client
pub(crate) const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pause before relaunching both pipelines after a failure
pub(crate) const RESTART_DELAY: Duration = Duration::from_millis(500);

/// Hex-encode a byte slice for debug output
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Flight data port device path (both directions)
    pub serial_port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// TCP port for the telemetry client
    pub telemetry_port: u16,
    /// TCP port for the command client
    pub command_port: u16,
    /// How much of the serial buffer to discard after each parse pass
    pub consume_policy: ConsumePolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial_port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            telemetry_port: TELEMETRY_PORT,
            command_port: COMMAND_PORT,
            consume_policy: ConsumePolicy::default(),
        }
    }
}

impl BridgeConfig {
    /// Substitute a simulator device for the flight data port, if given
    pub fn with_simulator_port(mut self, port: Option<String>) -> Self {
        if let Some(port) = port {
            self.serial_port = port;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.serial_port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.telemetry_port, 2950);
        assert_eq!(config.command_port, 2951);
        assert_eq!(config.consume_policy, ConsumePolicy::AllAttempted);
    }

    #[test]
    fn test_simulator_port_override() {
        let config = BridgeConfig::default().with_simulator_port(Some("/dev/pts/7".to_string()));
        assert_eq!(config.serial_port, "/dev/pts/7");

        let config = BridgeConfig::default().with_simulator_port(None);
        assert_eq!(config.serial_port, DEFAULT_SERIAL_PORT);
    }
}
