//! Envelope serialisation.
//!
//! The layout is `[header][u24 metadata length][metadata][data]`, where the
//! length and metadata are present only when the METADATA flag is set.

use bytes::{BufMut, Bytes, BytesMut};

use super::{Frame, FrameEncodeError, FrameHeader, HEADER_SIZE, MalformedFrame};
use crate::byte_order::{U24_MAX, read_network_u24, write_network_u24};

/// Width of the metadata length prefix.
pub const METADATA_LENGTH_SIZE: usize = 3;

/// Largest metadata block the length prefix can describe.
pub const MAX_METADATA_LENGTH: usize = U24_MAX as usize;

/// Encode `frame` into a single buffer sized to the envelope.
///
/// # Errors
///
/// Returns [`FrameEncodeError::MetadataTooLarge`] when the metadata block does
/// not fit the 24-bit length prefix.
pub fn encode(frame: &Frame) -> Result<Bytes, FrameEncodeError> {
    let mut dst = BytesMut::with_capacity(frame.encoded_len());
    encode_into(frame, &mut dst)?;
    Ok(dst.freeze())
}

/// Append the encoded form of `frame` to `dst`.
///
/// # Errors
///
/// Returns [`FrameEncodeError::MetadataTooLarge`] when the metadata block does
/// not fit the 24-bit length prefix. Nothing is written in that case.
pub fn encode_into(frame: &Frame, dst: &mut BytesMut) -> Result<(), FrameEncodeError> {
    let metadata_len = match frame.metadata() {
        Some(metadata) => Some(
            u32::try_from(metadata.len())
                .ok()
                .filter(|len| *len <= U24_MAX)
                .ok_or(FrameEncodeError::MetadataTooLarge {
                    len: metadata.len(),
                })?,
        ),
        None => None,
    };

    dst.reserve(frame.encoded_len());
    dst.put_slice(&frame.header().to_bytes());
    if let (Some(len), Some(metadata)) = (metadata_len, frame.metadata()) {
        dst.put_slice(&write_network_u24(len));
        dst.put_slice(metadata);
    }
    dst.put_slice(frame.data());
    Ok(())
}

/// Decode one envelope occupying the whole of `bytes`.
///
/// Metadata and data are returned as zero-copy slices of `bytes`.
///
/// # Errors
///
/// Returns [`MalformedFrame`] when the header is truncated or unknown, when
/// the METADATA flag is set without a complete length prefix, or when the
/// prefix declares more metadata than remains.
pub fn decode(mut bytes: Bytes) -> Result<Frame, MalformedFrame> {
    let header = FrameHeader::parse(&bytes)?;
    let mut body = bytes.split_off(HEADER_SIZE);

    let metadata = if header.has_metadata() {
        let Some(prefix) = body.first_chunk::<METADATA_LENGTH_SIZE>().copied() else {
            return Err(MalformedFrame::MissingMetadataLength {
                remaining: body.len(),
            });
        };
        let declared = read_network_u24(prefix) as usize;
        let remaining = body.len() - METADATA_LENGTH_SIZE;
        if declared > remaining {
            return Err(MalformedFrame::MetadataOverrun {
                declared,
                remaining,
            });
        }
        let mut rest = body.split_off(METADATA_LENGTH_SIZE);
        let data = rest.split_off(declared);
        body = data;
        Some(rest)
    } else {
        None
    };

    Ok(Frame::new(header, metadata, body))
}
