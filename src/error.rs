//! Canonical error and result types for the crate.
//!
//! Each subsystem defines its own error enum; [`Error`] aggregates them for
//! callers driving a whole connection, such as the
//! [`ReliableFrameCodec`](crate::codec::ReliableFrameCodec).

use std::io;

use thiserror::Error;

use crate::{
    config::ConfigError,
    fragment::{FragmentationError, ReassemblyError},
    frame::{FrameEncodeError, MalformedFrame},
    session::{ConnectionError, SessionError},
};

/// Top-level error type exposed by `reframe`.
#[derive(Debug, Error)]
pub enum Error {
    /// An error in the underlying transport.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// An inbound envelope could not be decoded.
    #[error("malformed frame: {0}")]
    Malformed(#[from] MalformedFrame),
    /// An outbound frame could not be encoded.
    #[error("frame encode error: {0}")]
    Encode(#[from] FrameEncodeError),
    /// Fragmentation was configured with invalid limits.
    #[error("fragmentation error: {0}")]
    Fragmentation(#[from] FragmentationError),
    /// Inbound fragments violated the reassembly rules.
    #[error("reassembly error: {0}")]
    Reassembly(#[from] ReassemblyError),
    /// A session operation was rejected.
    #[error("session error: {0}")]
    Session(#[from] SessionError),
    /// A transport connection refused a frame.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Settings failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the connection that produced this error must be closed.
    ///
    /// Codec, reassembly, and transport failures are fatal to their
    /// connection. Configuration errors surface before any connection exists
    /// and session errors are expected outcomes of concurrent teardown.
    #[must_use]
    pub fn is_connection_fatal(&self) -> bool {
        match self {
            Self::Io(_)
            | Self::Malformed(_)
            | Self::Encode(_)
            | Self::Reassembly(_)
            | Self::Connection(_) => true,
            Self::Fragmentation(_) | Self::Session(_) | Self::Config(_) => false,
        }
    }
}

/// Canonical result alias used by `reframe` public APIs.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use rstest::rstest;

    use super::*;
    use crate::{fragment::UnexpectedFragmentReason, frame::StreamId};

    #[rstest]
    #[case::io(Error::from(io::Error::from(io::ErrorKind::BrokenPipe)), true)]
    #[case::malformed(Error::from(MalformedFrame::TruncatedHeader { len: 2 }), true)]
    #[case::reassembly(
        Error::from(ReassemblyError::UnexpectedFragment {
            stream_id: StreamId::new(1),
            reason: UnexpectedFragmentReason::NoOpenBuffer,
        }),
        true
    )]
    #[case::budget(
        Error::from(ReassemblyError::FragmentBudgetExceeded {
            stream_id: StreamId::new(1),
            attempted: 11,
            limit: NonZeroUsize::new(10).expect("non-zero"),
        }),
        true
    )]
    #[case::disposed(Error::from(SessionError::Disposed), false)]
    #[case::config(
        Error::from(FragmentationError::InvalidFragmentSize { size: 1, min: 64, max: 128 }),
        false
    )]
    fn fatality_follows_error_policy(#[case] error: Error, #[case] fatal: bool) {
        assert_eq!(error.is_connection_fatal(), fatal);
    }

    #[test]
    fn display_names_the_layer() {
        let error = Error::from(SessionError::NotAttached);
        assert_eq!(
            error.to_string(),
            "session error: session has no attached connection"
        );
    }
}
