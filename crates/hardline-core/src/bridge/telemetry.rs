//! Telemetry uplink pipeline (serial → TCP)
//!
//! Awaits the flight data port, accepts one ground-station client, then
//! streams: read whatever the radio link has, split the accumulated buffer
//! into candidate frames, forward the valid ones, drain the consumed prefix.

use std::io::{self, Write};

use tracing::{debug, info, warn};

use super::{control::Control, hex, link, BridgeConfig, POLL_INTERVAL};
use crate::protocol::{split_candidates, BridgeError, ByteChannel, Frame, SerialChannel, SYNC_MARKER};

/// How much of the serial buffer to discard after each parse pass.
///
/// The single decision point for the consume-on-attempt semantics: the
/// parser itself never consumes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumePolicy {
    /// Advance past every candidate the parser emitted, rejected ones
    /// included. A rejected candidate is dropped for good: a frame whose
    /// length field is corrupted in transit is lost rather than retried.
    #[default]
    AllAttempted,
    /// Advance only past the leading run of valid frames. The first rejected
    /// candidate and everything after it stay buffered for the next pass, so
    /// a frame that was merely truncated at a read boundary can complete.
    ValidPrefix,
}

/// What one parse pass did with the buffer
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct PumpStats {
    /// Buffer prefix to drain
    pub advance: usize,
    /// Valid frames written to the client
    pub forwarded: usize,
    /// Candidates rejected by validation
    pub rejected: usize,
    /// Frames that failed to send (still counted as forwarded work)
    pub send_failures: usize,
}

/// Run one parse pass over `buffer`, forwarding valid frames to `client`.
///
/// Send failures are reported but do not abort the pass; the frame is
/// dropped and the buffer still advances.
pub(crate) fn pump<W: Write>(buffer: &[u8], policy: ConsumePolicy, client: &mut W) -> PumpStats {
    let (candidates, consumed) = split_candidates(buffer, &SYNC_MARKER);
    let total: usize = candidates.iter().map(|c| c.len()).sum();

    let mut stats = PumpStats {
        // Bytes before the first marker can never frame up; they go with
        // the first pass that emits anything.
        advance: consumed - total,
        ..PumpStats::default()
    };

    for candidate in candidates {
        match Frame::parse(candidate) {
            Ok(frame) => {
                debug!(
                    "frame: apid={} seq={} declared_len={} ({} bytes)",
                    frame.apid,
                    frame.sequence,
                    frame.declared_len,
                    frame.bytes.len()
                );
                if let Err(err) = client.write_all(&frame.bytes) {
                    warn!("failed to send frame to ground station: {err}");
                    stats.send_failures += 1;
                } else {
                    stats.forwarded += 1;
                }
                stats.advance += candidate.len();
            }
            Err(reject) => {
                debug!("dropping candidate ({} bytes): {reject}", candidate.len());
                stats.rejected += 1;
                match policy {
                    ConsumePolicy::AllAttempted => stats.advance += candidate.len(),
                    ConsumePolicy::ValidPrefix => break,
                }
            }
        }
    }

    stats
}

/// Stream frames from an established radio link to a connected client.
///
/// Polls the link for pending input (yielding between polls), accumulates
/// reads in the serial buffer, and runs [`pump`] after every read. Returns
/// when the link fails or a stop is requested.
pub fn stream_frames<C, W>(
    link: &mut C,
    mut client: W,
    policy: ConsumePolicy,
    control: &Control,
) -> Result<(), BridgeError>
where
    C: ByteChannel,
    W: Write,
{
    let mut buffer: Vec<u8> = Vec::new();

    loop {
        if control.stopping() {
            return Err(BridgeError::Shutdown);
        }

        let pending = link.bytes_to_read()? as usize;
        if pending == 0 {
            if !control.sleep(POLL_INTERVAL) {
                return Err(BridgeError::Shutdown);
            }
            continue;
        }

        let mut chunk = vec![0u8; pending];
        let read = link.read(&mut chunk)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "radio link closed").into());
        }
        chunk.truncate(read);
        debug!("new serial chunk ({} bytes): {}", read, hex(&chunk));
        buffer.extend_from_slice(&chunk);

        let stats = pump(&buffer, policy, &mut client);
        if stats.advance > 0 {
            buffer.drain(..stats.advance);
        }
    }
}

/// Run the telemetry pipeline until it fails or is stopped
pub(crate) fn run(config: &BridgeConfig, control: &Control) -> Result<(), BridgeError> {
    let port = link::connect_serial(&config.serial_port, config.baud_rate, control)?;
    let mut channel = SerialChannel::new(port);

    let client = link::accept_one(config.telemetry_port, "telemetry", control)?;
    // Sends must not block the serial poll loop behind a slow client
    client.set_nonblocking(true)?;
    info!("streaming telemetry to ground station");

    stream_frames(&mut channel, client, config.consume_policy, control)
}
