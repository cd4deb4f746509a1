//! Wire-level framing properties exercised through the public API

use byteorder::{BigEndian, ByteOrder};
use pretty_assertions::assert_eq;

use hardline_core::protocol::{
    split_candidates, Frame, FrameReject, FRAME_OVERHEAD, SYNC_MARKER,
};

fn make_frame(apid: u16, seq: u16, declared: u16) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&SYNC_MARKER);
    let mut field = [0u8; 2];
    BigEndian::write_u16(&mut field, apid);
    frame.extend_from_slice(&field);
    BigEndian::write_u16(&mut field, seq);
    frame.extend_from_slice(&field);
    BigEndian::write_u16(&mut field, declared);
    frame.extend_from_slice(&field);
    frame.resize(declared as usize + FRAME_OVERHEAD, 0x5A);
    frame
}

#[test]
fn two_back_to_back_frames_cover_the_buffer() {
    let f1 = make_frame(0x0007, 0x0001, 5);
    let f2 = make_frame(0x0008, 0x0002, 12);
    let mut buffer = f1.clone();
    buffer.extend_from_slice(&f2);

    let (candidates, consumed) = split_candidates(&buffer, &SYNC_MARKER);

    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates.concat(), buffer);
    assert_eq!(consumed, f1.len() + f2.len());
}

#[test]
fn reference_frame_accepted_with_overhead_of_eleven() {
    // sync + APID 0x0007 + seq 0x0001 + declared_len 5, total 16 bytes:
    // actual = 16 - 11 = 5 matches the declared length.
    let frame = make_frame(0x0007, 0x0001, 5);
    assert_eq!(frame.len(), 16);

    let parsed = Frame::parse(&frame).expect("reference frame should validate");
    assert_eq!(parsed.apid, 0x0007);
    assert_eq!(parsed.sequence, 0x0001);
    assert_eq!(parsed.declared_len, 5);
}

#[test]
fn trailing_extra_byte_rejected_but_candidate_complete() {
    let mut frame = make_frame(0x0007, 0x0001, 5);
    frame.push(0x00);
    assert_eq!(frame.len(), 17);

    // With no following sync marker the whole 17 bytes form one candidate
    let (candidates, consumed) = split_candidates(&frame, &SYNC_MARKER);
    assert_eq!(candidates.len(), 1);
    assert_eq!(consumed, frame.len());

    let err = Frame::parse(candidates[0]).unwrap_err();
    assert!(matches!(err, FrameReject::LengthMismatch { declared: 5, frame_len: 17 }));
}

#[test]
fn partial_tail_waits_for_more_data() {
    let frame = make_frame(0x0011, 0x0042, 8);

    // First seven bytes: the read boundary lands mid-header
    let (candidates, consumed) = split_candidates(&frame[..7], &SYNC_MARKER);
    assert!(candidates.is_empty());
    assert_eq!(consumed, 0);

    // Once the rest arrives the same buffer yields the complete frame
    let (candidates, consumed) = split_candidates(&frame, &SYNC_MARKER);
    assert_eq!(candidates.len(), 1);
    assert_eq!(consumed, frame.len());
    assert!(Frame::parse(candidates[0]).is_ok());
}

#[test]
fn short_candidate_between_markers_rejected() {
    let mut buffer = SYNC_MARKER.to_vec();
    buffer.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
    buffer.extend_from_slice(&make_frame(1, 1, 0));

    let (candidates, _) = split_candidates(&buffer, &SYNC_MARKER);
    assert_eq!(candidates.len(), 2);

    let err = Frame::parse(candidates[0]).unwrap_err();
    assert_eq!(err, FrameReject::TooShort { len: 7 });
}

#[test]
fn forwarded_bytes_are_the_raw_span() {
    let frame = make_frame(0x0300, 0xFFFF, 32);
    let parsed = Frame::parse(&frame).expect("frame should validate");
    // Header included, nothing stripped
    assert_eq!(parsed.bytes, frame);
}
