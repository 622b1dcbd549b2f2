//! Bounded store of sent-but-unacknowledged frames.

use std::{collections::VecDeque, num::NonZeroUsize};

use bytes::Bytes;

use super::{ResumePosition, SessionError};

#[derive(Debug)]
struct StoredFrame {
    end: ResumePosition,
    frame: Bytes,
}

/// Ordered, byte-bounded queue of encoded frames awaiting acknowledgement.
///
/// Frames are addressed by byte position: the first retained frame starts at
/// [`first_available`](Self::first_available) and the last ends at
/// [`position`](Self::position). Pushing beyond the capacity evicts the oldest
/// frames, after which the session can no longer be resumed from before them.
/// Frames released by an acknowledgement count as delivered, so replaying
/// from below the acknowledged position starts after it instead.
#[derive(Debug)]
pub struct FrameStore {
    frames: VecDeque<StoredFrame>,
    first_available: ResumePosition,
    acknowledged: ResumePosition,
    position: ResumePosition,
    buffered: usize,
    capacity: NonZeroUsize,
}

impl FrameStore {
    /// Create an empty store retaining at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            frames: VecDeque::new(),
            first_available: ResumePosition::ZERO,
            acknowledged: ResumePosition::ZERO,
            position: ResumePosition::ZERO,
            buffered: 0,
            capacity,
        }
    }

    /// Append an encoded frame and return the position after it.
    pub fn push(&mut self, frame: Bytes) -> ResumePosition {
        self.position = self.position.advance(frame.len());
        self.buffered += frame.len();
        self.frames.push_back(StoredFrame {
            end: self.position,
            frame,
        });

        let mut evicted = 0_usize;
        while self.buffered > self.capacity.get() {
            let Some(oldest) = self.frames.pop_front() else {
                break;
            };
            self.release(&oldest);
            evicted += 1;
        }
        if evicted > 0 {
            log::debug!(
                "frame store over capacity: evicted={evicted}, first_available={}",
                self.first_available
            );
        }
        self.position
    }

    /// Release every frame ending at or before `position`.
    ///
    /// Positions below [`first_available`](Self::first_available) are
    /// ignored. A position inside a frame keeps that frame retained.
    /// Returns the number of frames released.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PositionOutOfRange`] if `position` lies beyond
    /// the last sent frame.
    pub fn release_through(&mut self, position: ResumePosition) -> Result<usize, SessionError> {
        if position > self.position {
            return Err(SessionError::PositionOutOfRange {
                position,
                last_sent: self.position,
            });
        }
        self.acknowledged = self.acknowledged.max(position);
        let mut released = 0;
        while self.frames.front().is_some_and(|stored| stored.end <= position) {
            if let Some(stored) = self.frames.pop_front() {
                self.release(&stored);
                released += 1;
            }
        }
        Ok(released)
    }

    /// Check that replay can start at `position`.
    ///
    /// Positions below the acknowledged position are treated as the
    /// acknowledged position.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PositionUnavailable`] if frames after
    /// `position` were evicted unacknowledged, or `position` follows the
    /// last sent frame.
    pub fn check_available(&self, position: ResumePosition) -> Result<(), SessionError> {
        let effective = position.max(self.acknowledged);
        if effective < self.first_available || position > self.position {
            return Err(SessionError::PositionUnavailable {
                requested: position,
                first_available: self.first_available,
                last_sent: self.position,
            });
        }
        Ok(())
    }

    /// Frames ending after `position`, oldest first.
    ///
    /// # Errors
    ///
    /// See [`check_available`](Self::check_available).
    pub fn frames_after(
        &self,
        position: ResumePosition,
    ) -> Result<impl Iterator<Item = &Bytes> + '_, SessionError> {
        self.check_available(position)?;
        let position = position.max(self.acknowledged);
        Ok(self
            .frames
            .iter()
            .skip_while(move |stored| stored.end <= position)
            .map(|stored| &stored.frame))
    }

    /// Position after the last frame pushed.
    #[must_use]
    pub fn position(&self) -> ResumePosition { self.position }

    /// Highest position released by an acknowledgement.
    #[must_use]
    pub fn acknowledged(&self) -> ResumePosition { self.acknowledged }

    /// Position at which the oldest retained frame starts.
    #[must_use]
    pub fn first_available(&self) -> ResumePosition { self.first_available }

    /// Number of retained frames.
    #[must_use]
    pub fn len(&self) -> usize { self.frames.len() }

    /// Whether no frames are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }

    /// Bytes currently retained.
    #[must_use]
    pub fn buffered_bytes(&self) -> usize { self.buffered }

    /// Drop every retained frame. Positions are left unchanged.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.buffered = 0;
        self.first_available = self.position;
    }

    fn release(&mut self, stored: &StoredFrame) {
        self.buffered -= stored.frame.len();
        self.first_available = stored.end;
    }
}
