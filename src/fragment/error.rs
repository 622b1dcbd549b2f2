//! Error types emitted by the fragmentation layer.
//!
//! Outbound configuration problems surface as [`FragmentationError`] before
//! any frame is sent; inbound protocol violations surface as
//! [`ReassemblyError`] and are fatal to the connection that produced them.

use std::{fmt, num::NonZeroUsize};

use thiserror::Error;

use crate::frame::{FrameType, StreamId};

/// Errors produced while configuring outbound fragmentation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The fragment size cannot hold the header overhead, or exceeds the
    /// largest frame the length prefix can describe.
    #[error("invalid fragment size {size}: must be between {min} and {max} bytes")]
    InvalidFragmentSize { size: usize, min: usize, max: usize },
    /// The reassembly budget is smaller than a single fragment.
    #[error("reassembly budget {budget} is smaller than the fragment size {fragment_size}")]
    BudgetBelowFragmentSize { budget: usize, fragment_size: usize },
}

/// Why an inbound fragment could not be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnexpectedFragmentReason {
    /// A continuation arrived for a stream with no open buffer.
    NoOpenBuffer,
    /// A non-continuation frame arrived while the stream was mid-reassembly.
    TypeMismatch { found: FrameType },
    /// FOLLOWS was set on a frame type that cannot be fragmented.
    NotFragmentable { frame_type: FrameType },
    /// A metadata chunk arrived after data bytes had been accumulated.
    MetadataAfterData,
    /// A metadata chunk arrived but the first fragment declared no metadata.
    MetadataNotDeclared,
}

impl fmt::Display for UnexpectedFragmentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOpenBuffer => f.write_str("continuation without an open buffer"),
            Self::TypeMismatch { found } => {
                write!(f, "{found} frame interrupted an open reassembly")
            }
            Self::NotFragmentable { frame_type } => {
                write!(f, "{frame_type} frames cannot be fragmented")
            }
            Self::MetadataAfterData => f.write_str("metadata chunk after data"),
            Self::MetadataNotDeclared => f.write_str("metadata chunk on a frame without metadata"),
        }
    }
}

/// Errors produced by the [`Reassembler`](crate::fragment::Reassembler).
///
/// The stream's buffer is discarded whenever one of these is returned.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// The fragment does not fit the stream's reassembly state.
    #[error("unexpected fragment on stream {stream_id}: {reason}")]
    UnexpectedFragment {
        stream_id: StreamId,
        reason: UnexpectedFragmentReason,
    },
    /// Accumulated bytes would exceed the configured budget.
    #[error(
        "reassembly budget exceeded on stream {stream_id}: attempted {attempted} bytes \
         (limit {limit})"
    )]
    FragmentBudgetExceeded {
        stream_id: StreamId,
        attempted: usize,
        limit: NonZeroUsize,
    },
}

impl ReassemblyError {
    /// Stream whose reassembly failed.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId {
        match self {
            Self::UnexpectedFragment { stream_id, .. }
            | Self::FragmentBudgetExceeded { stream_id, .. } => *stream_id,
        }
    }
}
