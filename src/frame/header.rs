//! Fixed six-byte frame header: stream id, frame type, and flags.
//!
//! ```text
//! 0                   1                   2                   3
//! |R|                     stream id (31 bits)                     |
//! |  frame type (6) |      flags (10)     |
//! ```

use std::{fmt, ops::BitOr};

use derive_more::{Display, From, Into};

use super::MalformedFrame;
use crate::byte_order::{read_network_u16, read_network_u32, write_network_u16, write_network_u32};

/// Encoded size of [`FrameHeader`] in bytes.
pub const HEADER_SIZE: usize = 6;

const STREAM_ID_MASK: u32 = 0x7FFF_FFFF;
const FLAGS_MASK: u16 = 0x03FF;
const FRAME_TYPE_SHIFT: u16 = 10;

/// Identifier of the logical stream a frame belongs to.
///
/// Stream `0` addresses the connection itself.
///
/// # Examples
///
/// ```
/// use reframe::frame::StreamId;
/// let id = StreamId::new(7);
/// assert_eq!(id.get(), 7);
/// assert!(!id.is_connection());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
#[display("{_0}")]
pub struct StreamId(u32);

impl StreamId {
    /// The connection-level stream.
    pub const CONNECTION: Self = Self(0);

    /// Create a stream identifier. The reserved top bit is discarded.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value & STREAM_ID_MASK) }

    /// Return the numeric identifier.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Whether this is the connection-level stream `0`.
    #[must_use]
    pub const fn is_connection(self) -> bool { self.0 == 0 }
}

/// Frame types understood by the envelope layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameType {
    Setup = 0x01,
    Lease = 0x02,
    Keepalive = 0x03,
    RequestResponse = 0x04,
    RequestFnf = 0x05,
    RequestStream = 0x06,
    RequestChannel = 0x07,
    RequestN = 0x08,
    Cancel = 0x09,
    Payload = 0x0A,
    Error = 0x0B,
    MetadataPush = 0x0C,
    Resume = 0x0D,
    ResumeOk = 0x0E,
    Ext = 0x3F,
}

impl FrameType {
    /// Whether frames of this type may be split into fragments.
    #[must_use]
    pub const fn is_fragmentable(self) -> bool {
        matches!(
            self,
            Self::RequestResponse
                | Self::RequestFnf
                | Self::RequestStream
                | Self::RequestChannel
                | Self::Payload
        )
    }

    /// Return the six-bit wire code.
    #[must_use]
    pub const fn code(self) -> u8 { self as u8 }
}

impl TryFrom<u8> for FrameType {
    type Error = MalformedFrame;

    fn try_from(code: u8) -> Result<Self, MalformedFrame> {
        Ok(match code {
            0x01 => Self::Setup,
            0x02 => Self::Lease,
            0x03 => Self::Keepalive,
            0x04 => Self::RequestResponse,
            0x05 => Self::RequestFnf,
            0x06 => Self::RequestStream,
            0x07 => Self::RequestChannel,
            0x08 => Self::RequestN,
            0x09 => Self::Cancel,
            0x0A => Self::Payload,
            0x0B => Self::Error,
            0x0C => Self::MetadataPush,
            0x0D => Self::Resume,
            0x0E => Self::ResumeOk,
            0x3F => Self::Ext,
            other => return Err(MalformedFrame::UnknownFrameType { code: other }),
        })
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Setup => "SETUP",
            Self::Lease => "LEASE",
            Self::Keepalive => "KEEPALIVE",
            Self::RequestResponse => "REQUEST_RESPONSE",
            Self::RequestFnf => "REQUEST_FNF",
            Self::RequestStream => "REQUEST_STREAM",
            Self::RequestChannel => "REQUEST_CHANNEL",
            Self::RequestN => "REQUEST_N",
            Self::Cancel => "CANCEL",
            Self::Payload => "PAYLOAD",
            Self::Error => "ERROR",
            Self::MetadataPush => "METADATA_PUSH",
            Self::Resume => "RESUME",
            Self::ResumeOk => "RESUME_OK",
            Self::Ext => "EXT",
        };
        f.write_str(name)
    }
}

/// Ten-bit flag field carried in every header.
///
/// # Examples
///
/// ```
/// use reframe::frame::Flags;
/// let flags = Flags::METADATA | Flags::FOLLOWS;
/// assert!(flags.contains(Flags::FOLLOWS));
/// assert!(!flags.without(Flags::FOLLOWS).contains(Flags::FOLLOWS));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Flags(u16);

impl Flags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// The receiver may ignore the frame if it does not understand it.
    pub const IGNORE: Self = Self(0x200);
    /// A length-prefixed metadata block follows the header.
    pub const METADATA: Self = Self(0x100);
    /// More fragments of the same logical frame follow.
    pub const FOLLOWS: Self = Self(0x080);
    /// The stream completes with this frame.
    pub const COMPLETE: Self = Self(0x040);
    /// The frame carries a payload element.
    pub const NEXT: Self = Self(0x020);

    /// Build flags from raw bits; bits outside the ten-bit field are dropped.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self { Self(bits & FLAGS_MASK) }

    /// Return the raw bits.
    #[must_use]
    pub const fn bits(self) -> u16 { self.0 }

    /// Whether every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

    /// Return a copy with `other` set.
    #[must_use]
    pub const fn with(self, other: Self) -> Self { Self(self.0 | other.0) }

    /// Return a copy with `other` cleared.
    #[must_use]
    pub const fn without(self, other: Self) -> Self { Self(self.0 & !other.0) }

    /// Return a copy with `other` set or cleared according to `enabled`.
    #[must_use]
    pub const fn set(self, other: Self, enabled: bool) -> Self {
        if enabled {
            self.with(other)
        } else {
            self.without(other)
        }
    }
}

impl BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output { self.with(rhs) }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 5] = [
            (Flags::IGNORE, "I"),
            (Flags::METADATA, "M"),
            (Flags::FOLLOWS, "F"),
            (Flags::COMPLETE, "C"),
            (Flags::NEXT, "N"),
        ];
        let mut any = false;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                f.write_str(name)?;
                any = true;
            }
        }
        if !any {
            f.write_str("-")?;
        }
        Ok(())
    }
}

/// Header shared by every frame on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    stream_id: StreamId,
    frame_type: FrameType,
    flags: Flags,
}

impl FrameHeader {
    /// Create a header.
    #[must_use]
    pub const fn new(stream_id: StreamId, frame_type: FrameType, flags: Flags) -> Self {
        Self {
            stream_id,
            frame_type,
            flags,
        }
    }

    /// Header of a continuation fragment for `stream_id`.
    #[must_use]
    pub const fn continuation(stream_id: StreamId, carries_metadata: bool, follows: bool) -> Self {
        let flags = Flags::NONE
            .set(Flags::METADATA, carries_metadata)
            .set(Flags::FOLLOWS, follows);
        Self::new(stream_id, FrameType::Payload, flags)
    }

    /// Stream the frame belongs to.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId { self.stream_id }

    /// Frame type.
    #[must_use]
    pub const fn frame_type(&self) -> FrameType { self.frame_type }

    /// Flag field.
    #[must_use]
    pub const fn flags(&self) -> Flags { self.flags }

    /// Return a copy of the header with different flags.
    #[must_use]
    pub const fn with_flags(self, flags: Flags) -> Self {
        Self::new(self.stream_id, self.frame_type, flags)
    }

    /// Whether the METADATA flag is set.
    #[must_use]
    pub const fn has_metadata(&self) -> bool { self.flags.contains(Flags::METADATA) }

    /// Whether the FOLLOWS flag is set.
    #[must_use]
    pub const fn follows(&self) -> bool { self.flags.contains(Flags::FOLLOWS) }

    /// Whether this header marks a continuation fragment.
    ///
    /// Continuations are PAYLOAD frames without NEXT or COMPLETE; a PAYLOAD
    /// frame that starts a logical frame always carries one of the two.
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        matches!(self.frame_type, FrameType::Payload)
            && !self.flags.contains(Flags::NEXT)
            && !self.flags.contains(Flags::COMPLETE)
    }

    /// Whether frames with this header are retained for resumption.
    #[must_use]
    pub const fn is_resumable(&self) -> bool { !self.stream_id.is_connection() }

    /// Serialise the header into its six-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let [s0, s1, s2, s3] = write_network_u32(self.stream_id.get() & STREAM_ID_MASK);
        let type_and_flags =
            (u16::from(self.frame_type.code()) << FRAME_TYPE_SHIFT) | self.flags.bits();
        let [t0, t1] = write_network_u16(type_and_flags);
        [s0, s1, s2, s3, t0, t1]
    }

    /// Parse a header from the start of `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedFrame::TruncatedHeader`] when fewer than
    /// [`HEADER_SIZE`] bytes are available, or
    /// [`MalformedFrame::UnknownFrameType`] for an unassigned type code.
    pub fn parse(bytes: &[u8]) -> Result<Self, MalformedFrame> {
        let Some([s0, s1, s2, s3, t0, t1]) = bytes.first_chunk::<HEADER_SIZE>().copied() else {
            return Err(MalformedFrame::TruncatedHeader { len: bytes.len() });
        };
        let stream_id = StreamId::new(read_network_u32([s0, s1, s2, s3]));
        let type_and_flags = read_network_u16([t0, t1]);
        let frame_type = FrameType::try_from(t0 >> 2)?;
        Ok(Self::new(
            stream_id,
            frame_type,
            Flags::from_bits(type_and_flags),
        ))
    }
}

impl fmt::Display for FrameHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} stream={} flags={}",
            self.frame_type, self.stream_id, self.flags
        )
    }
}
