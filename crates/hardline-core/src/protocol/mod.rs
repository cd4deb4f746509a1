//! Radio Link Protocol
//!
//! Implements the wire format spoken on the flight-software data radio link:
//! sync-marker delimited frames with a fixed 10-byte header carrying APID,
//! sequence counter and a declared payload length.

mod error;
mod frame;
pub mod serial;
pub mod stream;

pub use error::BridgeError;
pub use frame::{split_candidates, Frame, FrameReject};
pub use stream::{ByteChannel, SerialChannel, TcpChannel};

/// Fixed byte sequence marking the start of every frame
pub const SYNC_MARKER: [u8; 4] = [0x35, 0x2E, 0xF8, 0x53];

/// Minimum candidate length: a frame shorter than this carries no complete header
pub const FRAME_HEADER_LEN: usize = 10;

/// Overhead subtracted from the total frame size to obtain the actual
/// payload length. One byte larger than the header itself; the radio side
/// appears to account for an undocumented trailing byte, so the constant is
/// kept as the link actually behaves.
pub const FRAME_OVERHEAD: usize = 11;

/// Significant bits of the application process identifier
pub const APID_MASK: u16 = 0x07FF;

/// Default baud rate for the flight data port
pub const DEFAULT_BAUD_RATE: u32 = 115_200;
