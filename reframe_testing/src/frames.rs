//! Frame builders for tests.

use bytes::Bytes;
use reframe::frame::{Flags, Frame, FrameHeader, FrameType, StreamId, encode};

/// `len` bytes cycling through `0..251`, so misplaced slices are detectable.
#[must_use]
pub fn patterned(len: usize) -> Bytes {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("value below 251"))
        .collect()
}

/// A REQUEST_RESPONSE frame on `stream` with patterned metadata and data.
///
/// A `metadata_len` of `None` omits the metadata block entirely.
#[must_use]
pub fn request(stream: u32, metadata_len: Option<usize>, data_len: usize) -> Frame {
    let header = FrameHeader::new(
        StreamId::new(stream),
        FrameType::RequestResponse,
        Flags::NONE,
    );
    Frame::new(header, metadata_len.map(patterned), patterned(data_len))
}

/// Encoded PAYLOAD frame on `stream` carrying `data_len` patterned bytes.
#[must_use]
pub fn encoded_payload(stream: u32, data_len: usize) -> Bytes {
    let header = FrameHeader::new(StreamId::new(stream), FrameType::Payload, Flags::NEXT);
    encode(&Frame::new(header, None, patterned(data_len))).expect("encode payload")
}
