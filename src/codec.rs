//! Transport codec combining framing, fragmentation, and reassembly.
//!
//! [`ReliableFrameCodec`] reads and writes frames prefixed by a 24-bit
//! big-endian length. Outbound logical frames are split by a [`Fragmenter`]
//! and every fragment is written with its own prefix; inbound fragments are
//! fed through a [`Reassembler`] so the decoder only yields complete logical
//! frames.
//!
//! Any decode error is fatal to the connection: the stream is left at an
//! unknown position and the caller should drop the transport.

use std::io;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::{
    byte_order::U24_MAX,
    error::Error,
    fragment::{FragmentationConfig, Fragmenter, Reassembler},
    frame::{self, Frame},
};

/// Width of the transport length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 3;

/// Largest frame the transport length prefix can describe.
pub const MAX_FRAME_LENGTH: usize = U24_MAX as usize;

/// Codec producing and consuming reassembled logical [`Frame`]s.
///
/// # Examples
///
/// ```
/// use bytes::{Bytes, BytesMut};
/// use reframe::{
///     codec::ReliableFrameCodec,
///     fragment::FragmentationConfig,
///     frame::{Flags, Frame, FrameHeader, FrameType, StreamId},
/// };
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let config = FragmentationConfig::new(64, 4096).expect("valid config");
/// let mut codec = ReliableFrameCodec::new(&config);
/// let header = FrameHeader::new(StreamId::new(1), FrameType::Payload, Flags::NEXT);
/// let frame = Frame::new(header, None, Bytes::from(vec![1_u8; 300]));
///
/// let mut wire = BytesMut::new();
/// codec.encode(frame.clone(), &mut wire).expect("encode");
/// assert_eq!(codec.decode(&mut wire).expect("decode"), Some(frame));
/// ```
#[derive(Debug)]
pub struct ReliableFrameCodec {
    framing: LengthDelimitedCodec,
    fragmenter: Fragmenter,
    reassembler: Reassembler,
}

impl ReliableFrameCodec {
    /// Build a codec from a validated fragmentation configuration.
    #[must_use]
    pub fn new(config: &FragmentationConfig) -> Self {
        Self {
            framing: LengthDelimitedCodec::builder()
                .length_field_length(LENGTH_PREFIX_SIZE)
                .max_frame_length(MAX_FRAME_LENGTH)
                .new_codec(),
            fragmenter: Fragmenter::from_config(config),
            reassembler: Reassembler::from_config(config),
        }
    }

    /// Outbound fragmenter.
    #[must_use]
    pub fn fragmenter(&self) -> &Fragmenter { &self.fragmenter }

    /// Inbound re-assembler.
    #[must_use]
    pub fn reassembler(&self) -> &Reassembler { &self.reassembler }
}

impl Decoder for ReliableFrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(wire) = self.framing.decode(src)? else {
                if self.reassembler.buffered_len() > 0 {
                    self.reassembler.purge_expired();
                }
                return Ok(None);
            };
            let fragment = frame::decode(wire.freeze())?;
            if let Some(frame) = self.reassembler.on_fragment(fragment)? {
                return Ok(Some(frame));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            let pending = self.reassembler.buffered_len();
            if pending > 0 {
                log::debug!("transport closed with partial frames: streams={pending}");
            }
            return Ok(None);
        }
        Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("connection closed mid-frame: {} bytes buffered", src.len()),
        )
        .into())
    }
}

impl Encoder<Frame> for ReliableFrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        for fragment in self.fragmenter.fragment(item) {
            let bytes = frame::encode(&fragment)?;
            self.framing.encode(bytes, dst)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, Bytes};
    use rstest::{fixture, rstest};

    use super::*;
    use crate::{
        byte_order::read_network_u24,
        fragment::ReassemblyError,
        frame::{Flags, FrameHeader, FrameType, StreamId},
    };

    #[expect(
        unused_braces,
        reason = "rustc false positive for single-line rstest fixtures"
    )]
    #[fixture]
    fn codec() -> ReliableFrameCodec {
        ReliableFrameCodec::new(&FragmentationConfig::new(64, 4096).expect("valid config"))
    }

    fn request(stream: u32, data_len: usize) -> Frame {
        let header = FrameHeader::new(
            StreamId::new(stream),
            FrameType::RequestResponse,
            Flags::NONE,
        );
        Frame::new(
            header,
            Some(Bytes::from_static(b"route")),
            Bytes::from(vec![9_u8; data_len]),
        )
    }

    #[rstest]
    fn oversized_frame_is_written_as_prefixed_fragments(mut codec: ReliableFrameCodec) {
        let mut wire = BytesMut::new();
        codec.encode(request(1, 200), &mut wire).expect("encode");

        let mut prefixes = Vec::new();
        let mut rest = &wire[..];
        while let Some(([a, b, c], tail)) = rest.split_first_chunk::<3>().map(|(p, t)| (*p, t)) {
            let len = read_network_u24([a, b, c]) as usize;
            prefixes.push(len);
            rest = &tail[len..];
        }
        assert_eq!(prefixes, vec![64, 64, 64, 40]);
    }

    #[rstest]
    fn decoder_waits_for_every_fragment(mut codec: ReliableFrameCodec) {
        let frame = request(3, 150);
        let mut wire = BytesMut::new();
        codec.encode(frame.clone(), &mut wire).expect("encode");

        let mut partial = wire.split_to(wire.len() - 5);
        assert_eq!(codec.decode(&mut partial).expect("decode"), None);
        assert_eq!(codec.reassembler().buffered_len(), 1);

        partial.unsplit(wire);
        assert_eq!(codec.decode(&mut partial).expect("decode"), Some(frame));
        assert!(partial.is_empty());
    }

    #[rstest]
    fn stray_continuation_is_fatal(mut codec: ReliableFrameCodec) {
        let continuation = Frame::new(
            FrameHeader::continuation(StreamId::new(4), false, false),
            None,
            Bytes::from_static(b"tail"),
        );
        let mut wire = BytesMut::new();
        codec.encode(continuation, &mut wire).expect("encode");

        let err = codec.decode(&mut wire).expect_err("must fail");
        assert!(matches!(
            err,
            Error::Reassembly(ReassemblyError::UnexpectedFragment { .. })
        ));
        assert!(err.is_connection_fatal());
    }

    #[rstest]
    fn truncated_envelope_is_malformed(mut codec: ReliableFrameCodec) {
        let mut wire = BytesMut::new();
        wire.put_slice(&[0, 0, 2, 0, 0]);
        assert!(matches!(
            codec.decode(&mut wire),
            Err(Error::Malformed(_))
        ));
    }

    #[rstest]
    fn eof_mid_frame_is_an_error(mut codec: ReliableFrameCodec) {
        let mut wire = BytesMut::from(&[0_u8, 0, 9, 1][..]);
        let err = codec.decode_eof(&mut wire).expect_err("must fail");
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[rstest]
    fn clean_eof_yields_nothing(mut codec: ReliableFrameCodec) {
        let mut wire = BytesMut::new();
        assert_eq!(codec.decode_eof(&mut wire).expect("clean close"), None);
    }
}
