//! Inbound helper that stitches fragments back into logical frames.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter)
//! by collecting fragment metadata and data keyed by
//! [`StreamId`](crate::frame::StreamId). Buffers live in a sharded map so
//! fragments for different streams can be applied concurrently through a
//! shared reference; fragments of one stream must still be applied in receive
//! order. A configurable budget bounds every buffer, and stale partial frames
//! can be purged after a timeout.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};
use dashmap::{DashMap, mapref::entry::Entry};

use super::{FragmentationConfig, ReassemblyError, UnexpectedFragmentReason};
use crate::{
    frame::{Flags, Frame, FrameHeader, StreamId},
    metrics,
};

#[derive(Debug)]
struct PartialFrame {
    header: FrameHeader,
    metadata: Option<BytesMut>,
    data: BytesMut,
    started_at: Instant,
}

impl PartialFrame {
    fn new(first: Frame, started_at: Instant) -> Self {
        let (header, metadata, data) = first.into_parts();
        Self {
            header,
            metadata: metadata.map(|chunk| BytesMut::from(&chunk[..])),
            data: BytesMut::from(&data[..]),
            started_at,
        }
    }

    fn len(&self) -> usize { self.metadata.as_ref().map_or(0, BytesMut::len) + self.data.len() }

    fn append(
        &mut self,
        metadata: Option<Bytes>,
        data: &[u8],
    ) -> Result<(), UnexpectedFragmentReason> {
        if let Some(chunk) = metadata {
            let Some(buffer) = self.metadata.as_mut() else {
                return Err(UnexpectedFragmentReason::MetadataNotDeclared);
            };
            if !self.data.is_empty() {
                return Err(UnexpectedFragmentReason::MetadataAfterData);
            }
            buffer.extend_from_slice(&chunk);
        }
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn into_frame(self) -> Frame {
        let header = self
            .header
            .with_flags(self.header.flags().without(Flags::FOLLOWS));
        Frame::new(
            header,
            self.metadata.map(BytesMut::freeze),
            self.data.freeze(),
        )
    }
}

/// Per-connection fragment re-assembler with budget enforcement.
#[derive(Debug)]
pub struct Reassembler {
    max_reassembly_size: NonZeroUsize,
    timeout: Duration,
    buffers: DashMap<StreamId, PartialFrame>,
}

impl Reassembler {
    /// Create a re-assembler capping each stream's buffer at
    /// `max_reassembly_size` bytes of metadata and data.
    #[must_use]
    pub fn new(max_reassembly_size: NonZeroUsize, timeout: Duration) -> Self {
        Self {
            max_reassembly_size,
            timeout,
            buffers: DashMap::new(),
        }
    }

    /// Create a re-assembler from a validated configuration.
    #[must_use]
    pub fn from_config(config: &FragmentationConfig) -> Self {
        Self::new(config.max_reassembly_size(), config.reassembly_timeout())
    }

    /// Apply one inbound wire frame using the current time.
    ///
    /// Returns `Ok(Some(_))` when the frame completes a logical frame (or was
    /// never fragmented), `Ok(None)` while more fragments are required, or an
    /// error when the stream's reassembly invariants are violated.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::UnexpectedFragment`] for continuations
    /// without an open buffer, frames that interrupt an open buffer, FOLLOWS
    /// on unfragmentable types, and misplaced metadata chunks; returns
    /// [`ReassemblyError::FragmentBudgetExceeded`] when the buffer would grow
    /// beyond the configured budget. The stream's buffer is discarded in
    /// every error case.
    pub fn on_fragment(&self, fragment: Frame) -> Result<Option<Frame>, ReassemblyError> {
        self.on_fragment_at(fragment, Instant::now())
    }

    /// Apply one inbound wire frame using an explicit clock reading.
    ///
    /// The reading only stamps newly opened buffers so that
    /// [`purge_expired_at`](Self::purge_expired_at) can evict them later.
    ///
    /// # Errors
    ///
    /// See [`on_fragment`](Self::on_fragment).
    pub fn on_fragment_at(
        &self,
        fragment: Frame,
        now: Instant,
    ) -> Result<Option<Frame>, ReassemblyError> {
        let header = *fragment.header();
        let stream_id = header.stream_id();

        match self.buffers.entry(stream_id) {
            Entry::Occupied(mut occupied) => {
                if !header.is_continuation() {
                    occupied.remove();
                    return Err(Self::unexpected(
                        stream_id,
                        UnexpectedFragmentReason::TypeMismatch {
                            found: header.frame_type(),
                        },
                    ));
                }

                let attempted = occupied.get().len().saturating_add(chunk_len(&fragment));
                if let Err(err) = self.check_budget(stream_id, attempted) {
                    occupied.remove();
                    return Err(err);
                }

                let (_, metadata, data) = fragment.into_parts();
                if let Err(reason) = occupied.get_mut().append(metadata, &data) {
                    occupied.remove();
                    return Err(Self::unexpected(stream_id, reason));
                }

                if header.follows() {
                    return Ok(None);
                }
                metrics::inc_frames_reassembled();
                Ok(Some(occupied.remove().into_frame()))
            }
            Entry::Vacant(vacant) => {
                if header.is_continuation() {
                    return Err(Self::unexpected(
                        stream_id,
                        UnexpectedFragmentReason::NoOpenBuffer,
                    ));
                }
                self.check_budget(stream_id, chunk_len(&fragment))?;
                if !header.follows() {
                    return Ok(Some(fragment));
                }
                if !header.frame_type().is_fragmentable() {
                    return Err(Self::unexpected(
                        stream_id,
                        UnexpectedFragmentReason::NotFragmentable {
                            frame_type: header.frame_type(),
                        },
                    ));
                }
                vacant.insert(PartialFrame::new(fragment, now));
                Ok(None)
            }
        }
    }

    /// Drop the partial frame for `stream_id`, if any.
    ///
    /// Returns whether a buffer was discarded.
    pub fn discard(&self, stream_id: StreamId) -> bool { self.buffers.remove(&stream_id).is_some() }

    /// Remove any partial frames that exceeded the configured timeout.
    ///
    /// Returns the identifiers of streams whose buffers were evicted.
    pub fn purge_expired(&self) -> Vec<StreamId> { self.purge_expired_at(Instant::now()) }

    /// Remove any partial frames that exceeded the configured timeout using
    /// an explicit clock reading.
    ///
    /// `DashMap::retain` takes every shard's write lock in turn, so call this
    /// from the connection's read loop or a maintenance task rather than per
    /// fragment.
    pub fn purge_expired_at(&self, now: Instant) -> Vec<StreamId> {
        let mut evicted = Vec::new();
        let timeout = self.timeout;

        self.buffers.retain(|stream_id, partial| {
            let expired = now.saturating_duration_since(partial.started_at) >= timeout;
            if expired {
                evicted.push(*stream_id);
            }
            !expired
        });

        if !evicted.is_empty() {
            log::debug!("evicted stale reassembly buffers: streams={evicted:?}");
        }
        evicted
    }

    /// Number of partial frames currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.buffers.len() }

    fn check_budget(&self, stream_id: StreamId, attempted: usize) -> Result<(), ReassemblyError> {
        if attempted > self.max_reassembly_size.get() {
            log::warn!(
                "reassembly budget exceeded: stream_id={stream_id}, attempted={attempted}, \
                 limit={}",
                self.max_reassembly_size
            );
            metrics::inc_reassembly_failures("budget");
            return Err(ReassemblyError::FragmentBudgetExceeded {
                stream_id,
                attempted,
                limit: self.max_reassembly_size,
            });
        }
        Ok(())
    }

    fn unexpected(stream_id: StreamId, reason: UnexpectedFragmentReason) -> ReassemblyError {
        log::warn!("discarding reassembly state: stream_id={stream_id}, reason={reason}");
        metrics::inc_reassembly_failures("unexpected");
        ReassemblyError::UnexpectedFragment { stream_id, reason }
    }
}

fn chunk_len(fragment: &Frame) -> usize {
    fragment.metadata().map_or(0, Bytes::len) + fragment.data().len()
}
