//! Errors raised while encoding or decoding the frame envelope.

use thiserror::Error;

/// Inbound envelope bytes that do not describe a valid frame.
///
/// Every variant is fatal to the connection that produced the bytes.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Fewer bytes than a header were supplied.
    #[error("truncated frame header: {len} bytes available")]
    TruncatedHeader { len: usize },
    /// The header's type field holds an unassigned code.
    #[error("unknown frame type code {code:#04x}")]
    UnknownFrameType { code: u8 },
    /// The METADATA flag is set but the length prefix is missing or cut short.
    #[error("metadata flag set but only {remaining} bytes follow the header")]
    MissingMetadataLength { remaining: usize },
    /// The metadata length prefix claims more bytes than the frame holds.
    #[error("metadata length {declared} exceeds the {remaining} bytes remaining")]
    MetadataOverrun { declared: usize, remaining: usize },
}

/// Errors produced while encoding an outbound frame.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FrameEncodeError {
    /// Metadata does not fit the 24-bit length prefix.
    #[error("metadata of {len} bytes exceeds the 24-bit length prefix")]
    MetadataTooLarge { len: usize },
}
