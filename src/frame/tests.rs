//! Tests for the frame header and envelope codec.

use bytes::{BufMut, Bytes, BytesMut};
use rstest::rstest;

use super::{
    Flags,
    Frame,
    FrameEncodeError,
    FrameHeader,
    FrameType,
    HEADER_SIZE,
    MAX_METADATA_LENGTH,
    MalformedFrame,
    StreamId,
    decode,
    encode,
};

fn header(flags: Flags) -> FrameHeader {
    FrameHeader::new(StreamId::new(5), FrameType::RequestResponse, flags)
}

#[test]
fn header_layout_matches_wire_format() {
    let header = FrameHeader::new(
        StreamId::new(0x0102_0304),
        FrameType::Payload,
        Flags::METADATA | Flags::NEXT,
    );
    // Type 0x0A in the top six bits, flags 0x120 in the low ten.
    assert_eq!(header.to_bytes(), [0x01, 0x02, 0x03, 0x04, 0x29, 0x20]);
    assert_eq!(FrameHeader::parse(&header.to_bytes()), Ok(header));
}

#[test]
fn reserved_stream_bit_is_ignored() {
    let mut bytes = header(Flags::NONE).to_bytes();
    bytes[0] |= 0x80;
    let parsed = FrameHeader::parse(&bytes).expect("header parses");
    assert_eq!(parsed.stream_id(), StreamId::new(5));
}

#[test]
fn unknown_frame_type_is_rejected() {
    let bytes = [0, 0, 0, 1, 0x10 << 2, 0];
    assert_eq!(
        FrameHeader::parse(&bytes),
        Err(MalformedFrame::UnknownFrameType { code: 0x10 })
    );
}

#[rstest]
#[case::setup(0x01, Ok(FrameType::Setup))]
#[case::payload(0x0A, Ok(FrameType::Payload))]
#[case::error(0x0B, Ok(FrameType::Error))]
#[case::ext(0x3F, Ok(FrameType::Ext))]
#[case::unassigned(0x3E, Err(MalformedFrame::UnknownFrameType { code: 0x3E }))]
fn frame_type_codes_convert(#[case] code: u8, #[case] expected: Result<FrameType, MalformedFrame>) {
    assert_eq!(FrameType::try_from(code), expected);
    if let Ok(frame_type) = expected {
        assert_eq!(frame_type.code(), code);
    }
}

#[rstest]
#[case::with_metadata(Some(Bytes::from_static(b"meta")), Bytes::from_static(b"data"))]
#[case::empty_metadata(Some(Bytes::new()), Bytes::from_static(b"data"))]
#[case::no_metadata(None, Bytes::from_static(b"data"))]
#[case::empty_everything(None, Bytes::new())]
fn envelope_round_trips(#[case] metadata: Option<Bytes>, #[case] data: Bytes) {
    let frame = Frame::new(header(Flags::NEXT), metadata.clone(), data.clone());
    let encoded = encode(&frame).expect("encode frame");
    assert_eq!(encoded.len(), frame.encoded_len());

    let decoded = decode(encoded).expect("decode frame");
    assert_eq!(decoded.metadata(), metadata.as_ref());
    assert_eq!(decoded.data(), &data);
    assert_eq!(decoded, frame);
}

#[test]
fn empty_metadata_is_distinct_from_absent_metadata() {
    let present = encode(&Frame::new(header(Flags::NONE), Some(Bytes::new()), Bytes::new()))
        .expect("encode");
    let absent = encode(&Frame::new(header(Flags::NONE), None, Bytes::new())).expect("encode");
    assert_eq!(present.len(), HEADER_SIZE + 3);
    assert_eq!(absent.len(), HEADER_SIZE);
    assert!(decode(present).expect("decode").metadata().is_some());
    assert!(decode(absent).expect("decode").metadata().is_none());
}

#[test]
fn frame_constructor_syncs_metadata_flag() {
    let frame = Frame::new(header(Flags::METADATA), None, Bytes::new());
    assert!(!frame.header().has_metadata());
}

#[test]
fn truncated_header_is_malformed() {
    let err = decode(Bytes::from_static(&[0, 0, 0])).expect_err("must fail");
    assert_eq!(err, MalformedFrame::TruncatedHeader { len: 3 });
}

#[test]
fn metadata_flag_without_length_is_malformed() {
    let mut buf = BytesMut::new();
    buf.put_slice(&header(Flags::METADATA).to_bytes());
    buf.put_u8(0);
    let err = decode(buf.freeze()).expect_err("must fail");
    assert_eq!(err, MalformedFrame::MissingMetadataLength { remaining: 1 });
}

#[test]
fn overlong_metadata_length_is_malformed() {
    let mut buf = BytesMut::new();
    buf.put_slice(&header(Flags::METADATA).to_bytes());
    buf.put_slice(&[0, 0, 9]);
    buf.put_slice(b"abc");
    let err = decode(buf.freeze()).expect_err("must fail");
    assert_eq!(
        err,
        MalformedFrame::MetadataOverrun {
            declared: 9,
            remaining: 3
        }
    );
}

#[test]
fn oversized_metadata_cannot_be_encoded() {
    let metadata = Bytes::from(vec![0_u8; MAX_METADATA_LENGTH + 1]);
    let frame = Frame::new(header(Flags::NONE), Some(metadata), Bytes::new());
    assert_eq!(
        encode(&frame),
        Err(FrameEncodeError::MetadataTooLarge {
            len: MAX_METADATA_LENGTH + 1
        })
    );
}

#[test]
fn continuation_headers_are_recognised() {
    let continuation = FrameHeader::continuation(StreamId::new(3), true, true);
    assert!(continuation.is_continuation());
    assert!(continuation.has_metadata());
    assert!(continuation.follows());

    let first = FrameHeader::new(
        StreamId::new(3),
        FrameType::Payload,
        Flags::NEXT | Flags::FOLLOWS,
    );
    assert!(!first.is_continuation());
}

#[test]
fn connection_stream_frames_are_not_resumable() {
    let keepalive = FrameHeader::new(StreamId::CONNECTION, FrameType::Keepalive, Flags::NONE);
    assert!(!keepalive.is_resumable());
    assert!(header(Flags::NONE).is_resumable());
}
