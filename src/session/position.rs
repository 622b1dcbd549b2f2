use derive_more::{Display, From, Into};

/// Byte offset into a session's stream of resumable frames.
///
/// The position after a frame is the total encoded length of every
/// resumable frame up to and including it.
///
/// # Examples
///
/// ```
/// use reframe::session::ResumePosition;
/// let position = ResumePosition::ZERO.advance(12);
/// assert_eq!(position.get(), 12);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into,
)]
#[display("{_0}")]
pub struct ResumePosition(u64);

impl ResumePosition {
    /// Position before any frame.
    pub const ZERO: Self = Self(0);

    /// Create a position from a byte offset.
    #[must_use]
    pub const fn new(offset: u64) -> Self { Self(offset) }

    /// Return the byte offset.
    #[must_use]
    pub const fn get(self) -> u64 { self.0 }

    /// Return the position `len` bytes further on, saturating at `u64::MAX`.
    #[must_use]
    pub fn advance(self, len: usize) -> Self {
        Self(self.0.saturating_add(u64::try_from(len).unwrap_or(u64::MAX)))
    }
}
