//! Outbound helper that splits logical frames into wire fragments.
//!
//! [`Fragmenter::fragment`] returns a lazy [`Fragments`] iterator. Frames whose
//! envelope already fits the configured fragment size are yielded unchanged.
//! Larger frames are cut into fragments of exactly the fragment size (the last
//! may be shorter): metadata is packed first, then data, so a fragment may
//! carry the tail of the metadata followed by the head of the data but never
//! the other way round.
//!
//! The first fragment keeps the original frame type and flags and adds
//! FOLLOWS. Every later fragment is a PAYLOAD continuation on the same stream
//! carrying only METADATA (when it holds a metadata chunk) and FOLLOWS (unless
//! it is the last). Fragments must reach the transport in iteration order.

use std::{iter::FusedIterator, num::NonZeroUsize};

use bytes::Bytes;

use super::{FragmentationConfig, FragmentationError, config::validate_fragment_size};
use crate::{
    frame::{Flags, Frame, FrameHeader, HEADER_SIZE, METADATA_LENGTH_SIZE},
    metrics,
};

/// Splits logical frames into fragment-sized wire frames.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    max_fragment_size: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter that caps encoded fragments at `max_fragment_size`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::InvalidFragmentSize`] when the size
    /// cannot hold the header overhead or exceeds the frame length ceiling.
    pub fn new(max_fragment_size: usize) -> Result<Self, FragmentationError> {
        Ok(Self {
            max_fragment_size: validate_fragment_size(max_fragment_size)?,
        })
    }

    /// Create a fragmenter from an already validated configuration.
    #[must_use]
    pub const fn from_config(config: &FragmentationConfig) -> Self {
        Self {
            max_fragment_size: config.max_fragment_size(),
        }
    }

    /// Return the maximum encoded fragment size in bytes.
    #[must_use]
    pub const fn max_fragment_size(&self) -> NonZeroUsize { self.max_fragment_size }

    /// Split `frame` into wire fragments.
    ///
    /// Frames that fit, and frames whose type cannot be fragmented, are
    /// yielded whole with FOLLOWS cleared.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use reframe::{
    ///     fragment::Fragmenter,
    ///     frame::{Flags, Frame, FrameHeader, FrameType, StreamId},
    /// };
    ///
    /// let fragmenter = Fragmenter::new(64).expect("valid size");
    /// let header = FrameHeader::new(StreamId::new(1), FrameType::RequestFnf, Flags::NONE);
    /// let frame = Frame::new(header, None, Bytes::from(vec![7_u8; 200]));
    /// let fragments: Vec<_> = fragmenter.fragment(frame).collect();
    /// assert_eq!(fragments.len(), 4);
    /// assert!(fragments[..3].iter().all(Frame::follows));
    /// assert!(!fragments[3].follows());
    /// ```
    #[must_use]
    pub fn fragment(&self, frame: Frame) -> Fragments {
        let max = self.max_fragment_size.get();
        let fits = frame.encoded_len() <= max;
        let (header, metadata, data) = frame.into_parts();
        let header = header.with_flags(header.flags().without(Flags::FOLLOWS));

        if fits || !header.frame_type().is_fragmentable() {
            if !fits {
                log::debug!("sending oversized {header} whole: frame type cannot be fragmented");
            }
            return Fragments {
                state: State::Whole(Frame::new(header, metadata, data)),
            };
        }

        Fragments {
            state: State::Splitting(Splitter {
                max,
                header,
                metadata,
                data,
                emitted: 0,
            }),
        }
    }
}

/// Lazy, ordered sequence of wire fragments for one logical frame.
#[derive(Debug)]
pub struct Fragments {
    state: State,
}

#[derive(Debug)]
enum State {
    Whole(Frame),
    Splitting(Splitter),
    Done,
}

#[derive(Debug)]
struct Splitter {
    max: usize,
    header: FrameHeader,
    // `Some` while metadata bytes remain to be sent, and for the first
    // fragment of a frame whose metadata block is present but empty.
    metadata: Option<Bytes>,
    data: Bytes,
    emitted: u64,
}

impl Splitter {
    /// Cut the next fragment, returning it with a flag telling whether it was
    /// the last one.
    fn next_fragment(&mut self) -> (Frame, bool) {
        let first = self.emitted == 0;
        let mut budget = self.max - HEADER_SIZE;

        let metadata_chunk = self.metadata.take().map(|mut remaining| {
            budget -= METADATA_LENGTH_SIZE;
            let take = budget.min(remaining.len());
            budget -= take;
            let chunk = remaining.split_to(take);
            if !remaining.is_empty() {
                self.metadata = Some(remaining);
            }
            chunk
        });

        let data_chunk = if self.metadata.is_none() {
            let take = budget.min(self.data.len());
            self.data.split_to(take)
        } else {
            Bytes::new()
        };

        let follows = self.metadata.is_some() || !self.data.is_empty();
        let header = if first {
            self.header
                .with_flags(self.header.flags().set(Flags::FOLLOWS, follows))
        } else {
            FrameHeader::continuation(self.header.stream_id(), metadata_chunk.is_some(), follows)
        };
        self.emitted += 1;

        (Frame::new(header, metadata_chunk, data_chunk), !follows)
    }
}

impl Iterator for Fragments {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        match std::mem::replace(&mut self.state, State::Done) {
            State::Whole(frame) => Some(frame),
            State::Splitting(mut splitter) => {
                let (fragment, last) = splitter.next_fragment();
                if last {
                    metrics::inc_fragments_emitted(splitter.emitted);
                } else {
                    self.state = State::Splitting(splitter);
                }
                Some(fragment)
            }
            State::Done => None,
        }
    }
}

impl FusedIterator for Fragments {}
