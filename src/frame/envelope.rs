//! Logical frame: header, optional metadata block, and data block.

use bytes::Bytes;

use super::{Flags, FrameHeader, HEADER_SIZE, METADATA_LENGTH_SIZE, StreamId};

/// A header together with its metadata and data blocks.
///
/// The METADATA flag always mirrors whether `metadata` is present, so an
/// empty-but-present block stays distinguishable from an absent one.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use reframe::frame::{Flags, Frame, FrameHeader, FrameType, StreamId};
///
/// let header = FrameHeader::new(StreamId::new(1), FrameType::Payload, Flags::NEXT);
/// let frame = Frame::new(header, Some(Bytes::new()), Bytes::from_static(b"hi"));
/// assert!(frame.header().has_metadata());
/// assert_eq!(frame.encoded_len(), 6 + 3 + 2);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    metadata: Option<Bytes>,
    data: Bytes,
}

impl Frame {
    /// Construct a frame, setting or clearing METADATA to match `metadata`.
    #[must_use]
    pub fn new(header: FrameHeader, metadata: Option<Bytes>, data: Bytes) -> Self {
        let flags = header.flags().set(Flags::METADATA, metadata.is_some());
        Self {
            header: header.with_flags(flags),
            metadata,
            data,
        }
    }

    /// Frame header.
    #[must_use]
    pub const fn header(&self) -> &FrameHeader { &self.header }

    /// Stream the frame belongs to.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId { self.header.stream_id() }

    /// Whether more fragments of the same logical frame follow.
    #[must_use]
    pub const fn follows(&self) -> bool { self.header.follows() }

    /// Metadata block, if present.
    #[must_use]
    pub fn metadata(&self) -> Option<&Bytes> { self.metadata.as_ref() }

    /// Data block.
    #[must_use]
    pub fn data(&self) -> &Bytes { &self.data }

    /// Size of the encoded envelope in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        let metadata = self
            .metadata
            .as_ref()
            .map_or(0, |metadata| METADATA_LENGTH_SIZE + metadata.len());
        HEADER_SIZE + metadata + self.data.len()
    }

    /// Consume the frame, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (FrameHeader, Option<Bytes>, Bytes) {
        (self.header, self.metadata, self.data)
    }
}
