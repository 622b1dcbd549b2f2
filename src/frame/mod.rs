//! Generic frame envelope: header, optional metadata, and data.
//!
//! [`encode`] and [`decode`] convert between [`Frame`] values and their wire
//! form. Frame type specific fields live inside the data block and are not
//! interpreted here.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod header;

pub use codec::{MAX_METADATA_LENGTH, METADATA_LENGTH_SIZE, decode, encode, encode_into};
pub use envelope::Frame;
pub use error::{FrameEncodeError, MalformedFrame};
pub use header::{Flags, FrameHeader, FrameType, HEADER_SIZE, StreamId};

#[cfg(test)]
mod tests;
