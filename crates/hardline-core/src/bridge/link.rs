//! Link establishment
//!
//! Serial connect-with-retry for the flight data port and single-client
//! accept for the ground-station listeners.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use serialport::SerialPort;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{info, warn};

use super::{control::Control, ACCEPT_POLL_INTERVAL, SERIAL_RETRY_INTERVAL};
use crate::protocol::{serial, BridgeError};

/// Open the flight data port, retrying forever with a fixed backoff.
///
/// Never fails permanently: device absence is logged and retried until the
/// port opens or a stop is requested.
pub(crate) fn connect_serial(
    device: &str,
    baud_rate: u32,
    control: &Control,
) -> Result<Box<dyn SerialPort>, BridgeError> {
    let mut port = connect_with_retry(
        || serial::open_port(device, baud_rate),
        control,
        SERIAL_RETRY_INTERVAL,
        device,
    )?;
    serial::configure_port(port.as_mut())?;
    info!("connected to flight data port {device}");
    Ok(port)
}

/// Retry loop shared by serial connection establishment.
///
/// Generic over the open operation so the retry-then-succeed behavior is
/// testable without hardware.
pub(crate) fn connect_with_retry<T>(
    mut open: impl FnMut() -> serialport::Result<T>,
    control: &Control,
    interval: Duration,
    device: &str,
) -> Result<T, BridgeError> {
    loop {
        if control.stopping() {
            return Err(BridgeError::Shutdown);
        }
        match open() {
            Ok(connection) => return Ok(connection),
            Err(err) => {
                warn!("flight data port {device} not found ({err}), retrying...");
                if !control.sleep(interval) {
                    return Err(BridgeError::Shutdown);
                }
            }
        }
    }
}

/// Bind a listener with `SO_REUSEADDR` so a restarted pipeline can reclaim
/// the port immediately.
fn bind_reusable(port: u16) -> io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;
    Ok(socket.into())
}

/// Accept exactly one ground-station client on `port`, then stop accepting.
///
/// The accept is a non-blocking poll so a stop request unblocks it. The
/// listener handle is dropped on return; no further client is accepted until
/// the pipeline is restarted.
pub(crate) fn accept_one(port: u16, label: &str, control: &Control) -> Result<TcpStream, BridgeError> {
    let listener = bind_reusable(port)?;
    listener.set_nonblocking(true)?;
    control.register_listener(&listener)?;
    info!("listening on port {port} for the {label} client");

    loop {
        if control.stopping() {
            return Err(BridgeError::Shutdown);
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false)?;
                control.register_client(&stream)?;
                info!("ground station connected from {peer} ({label})");
                return Ok(stream);
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                if !control.sleep(ACCEPT_POLL_INTERVAL) {
                    return Err(BridgeError::Shutdown);
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}
