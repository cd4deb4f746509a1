//! Command downlink pipeline (TCP → serial)
//!
//! Accepts one ground-station client and forwards everything it sends to the
//! flight data port, verbatim. Each received buffer gets its own short-lived
//! serial connection, released as soon as the write completes.

use std::io::{self, Read, Write};

use tracing::{debug, info};

use super::{control::Control, hex, link, BridgeConfig, MAX_COMMAND_READ, POLL_INTERVAL};
use crate::protocol::{serial, BridgeError, TcpChannel};

/// Forward client buffers to freshly opened links.
///
/// Blocking-reads up to [`MAX_COMMAND_READ`] bytes per call. An empty read is
/// treated as "no data yet" and retried after a yield, not as a peer
/// disconnect. For each non-empty buffer, `open_link` provides a new writer
/// that is dropped (closed) on every exit path, including write failure.
pub fn forward_commands<R, W, F>(
    client: &mut R,
    mut open_link: F,
    control: &Control,
) -> Result<(), BridgeError>
where
    R: Read,
    W: Write,
    F: FnMut() -> Result<W, BridgeError>,
{
    let mut buf = [0u8; MAX_COMMAND_READ];

    loop {
        if control.stopping() {
            return Err(BridgeError::Shutdown);
        }

        let read = match client.read(&mut buf) {
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };

        if read == 0 {
            if !control.sleep(POLL_INTERVAL) {
                return Err(BridgeError::Shutdown);
            }
            continue;
        }

        debug!("command from ground station ({} bytes): {}", read, hex(&buf[..read]));

        let mut link = open_link()?;
        link.write_all(&buf[..read])?;
    }
}

/// Run the command pipeline until it fails or is stopped
pub(crate) fn run(config: &BridgeConfig, control: &Control) -> Result<(), BridgeError> {
    let client = link::accept_one(config.command_port, "command", control)?;
    info!("forwarding ground-station commands to {}", config.serial_port);

    let device = config.serial_port.clone();
    let baud_rate = config.baud_rate;
    forward_commands(
        &mut TcpChannel::new(client),
        || serial::open_port(&device, baud_rate).map_err(BridgeError::from),
        control,
    )
}
