//! Frame extraction and validation
//!
//! Frame format (radio link downlink):
//! - 4 bytes: Sync marker
//! - 2 bytes: APID (big-endian, low 11 bits significant)
//! - 2 bytes: Sequence counter (big-endian)
//! - 2 bytes: Declared payload length (big-endian)
//! - N bytes: Payload
//!
//! The link never escapes sync bytes inside payloads, so a payload that
//! happens to contain the marker sequence is misread as a frame boundary.
//! That is a limitation of the wire format, not of the parser.

use byteorder::{BigEndian, ByteOrder};
use thiserror::Error;

use super::{APID_MASK, FRAME_HEADER_LEN, FRAME_OVERHEAD, SYNC_MARKER};

/// A validated frame extracted from the serial stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Application process identifier (masked to 11 bits)
    pub apid: u16,
    /// Sequence counter
    pub sequence: u16,
    /// Payload length as declared in the header
    pub declared_len: u16,
    /// The full raw candidate span, header included
    pub bytes: Vec<u8>,
}

/// Why a candidate failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameReject {
    /// The candidate cannot hold a complete header
    #[error("candidate of {len} bytes is shorter than a frame header")]
    TooShort {
        /// Candidate length in bytes
        len: usize,
    },

    /// The candidate does not start with the sync marker
    #[error("invalid sync bytes: {found:02x?}")]
    BadSync {
        /// The first four bytes of the candidate
        found: [u8; 4],
    },

    /// Header length field disagrees with the candidate's actual size
    #[error("declared payload length {declared} does not match frame of {frame_len} bytes")]
    LengthMismatch {
        /// Payload length claimed by the header
        declared: u16,
        /// Total candidate length in bytes
        frame_len: usize,
    },
}

impl Frame {
    /// Validate a candidate span and parse its header.
    ///
    /// Checks, in order: minimum length, sync marker, and that the declared
    /// payload length matches the candidate's size minus [`FRAME_OVERHEAD`].
    /// The returned frame keeps the complete raw span so it can be forwarded
    /// verbatim.
    pub fn parse(candidate: &[u8]) -> Result<Self, FrameReject> {
        if candidate.len() < FRAME_HEADER_LEN {
            return Err(FrameReject::TooShort {
                len: candidate.len(),
            });
        }

        if candidate[..4] != SYNC_MARKER {
            let mut found = [0u8; 4];
            found.copy_from_slice(&candidate[..4]);
            return Err(FrameReject::BadSync { found });
        }

        let apid = BigEndian::read_u16(&candidate[4..6]) & APID_MASK;
        let sequence = BigEndian::read_u16(&candidate[6..8]);
        let declared_len = BigEndian::read_u16(&candidate[8..10]);

        if declared_len as usize + FRAME_OVERHEAD != candidate.len() {
            return Err(FrameReject::LengthMismatch {
                declared: declared_len,
                frame_len: candidate.len(),
            });
        }

        Ok(Self {
            apid,
            sequence,
            declared_len,
            bytes: candidate.to_vec(),
        })
    }
}

/// Find the next occurrence of `sync` in `buffer` at or after `from`
fn find_marker(buffer: &[u8], sync: &[u8], from: usize) -> Option<usize> {
    if from > buffer.len() {
        return None;
    }
    buffer[from..]
        .windows(sync.len())
        .position(|window| window == sync)
        .map(|pos| pos + from)
}

/// Split an accumulated buffer into candidate frames.
///
/// Each candidate runs from one occurrence of `sync` to the next occurrence,
/// or to the end of the buffer for the last one. A trailing span shorter than
/// [`FRAME_HEADER_LEN`] with no following marker is withheld; the caller
/// must wait for more data before it can become a complete candidate.
///
/// Returns the candidates in wire order together with the number of leading
/// buffer bytes covered by the pass: the end offset of the last emitted
/// candidate, which also covers any bytes preceding the first marker (those
/// can never become part of a frame and are discarded with the pass). When
/// nothing is emitted the consumed count is zero.
pub fn split_candidates<'a>(buffer: &'a [u8], sync: &[u8]) -> (Vec<&'a [u8]>, usize) {
    let mut candidates = Vec::new();
    let mut consumed = 0;

    let mut start = match find_marker(buffer, sync, 0) {
        Some(pos) => pos,
        None => return (candidates, 0),
    };

    loop {
        match find_marker(buffer, sync, start + sync.len()) {
            Some(next) => {
                candidates.push(&buffer[start..next]);
                consumed = next;
                start = next;
            }
            None => {
                let tail = &buffer[start..];
                if tail.len() >= FRAME_HEADER_LEN {
                    candidates.push(tail);
                    consumed = buffer.len();
                }
                break;
            }
        }
    }

    (candidates, consumed)
}
