//! Serial port handling
//!
//! Low-level access to the flight data port. Connection retry lives in
//! [`crate::bridge::link`]; this module only knows how to open and configure
//! a port.

use serialport::SerialPort;
use std::time::Duration;

/// Read timeout applied to every opened port. Short so the telemetry
/// pipeline's check-then-read polling stays responsive.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Open the named device with default settings
pub fn open_port(name: &str, baud_rate: u32) -> serialport::Result<Box<dyn SerialPort>> {
    serialport::new(name, baud_rate)
        .timeout(READ_TIMEOUT)
        .open()
}

/// Configure a port for the radio link: standard 8N1, no flow control
pub fn configure_port(port: &mut dyn SerialPort) -> serialport::Result<()> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;
    Ok(())
}
