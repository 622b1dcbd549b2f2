//! Configuration used by fragmentation and reassembly.

use std::{num::NonZeroUsize, time::Duration};

use super::FragmentationError;
use crate::{
    byte_order::U24_MAX,
    frame::{HEADER_SIZE, METADATA_LENGTH_SIZE},
};

/// Smallest accepted fragment size.
///
/// Well above the nine bytes of header and metadata-length overhead so every
/// fragment carries a useful amount of payload.
pub const MIN_FRAGMENT_SIZE: usize = 64;

/// Largest fragment the 24-bit frame length prefix can describe.
pub const MAX_FRAGMENT_SIZE: usize = U24_MAX as usize;

/// Default cap on a single stream's reassembled metadata and data.
pub const DEFAULT_MAX_REASSEMBLY_SIZE: usize = 16 * 1024 * 1024;

/// Default age after which incomplete reassembly buffers are evicted.
pub const DEFAULT_REASSEMBLY_TIMEOUT: Duration = Duration::from_secs(30);

const _: () = assert!(MIN_FRAGMENT_SIZE > HEADER_SIZE + METADATA_LENGTH_SIZE);

/// Settings that bound fragment sizes and reassembly resource usage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FragmentationConfig {
    max_fragment_size: NonZeroUsize,
    max_reassembly_size: NonZeroUsize,
    reassembly_timeout: Duration,
}

impl FragmentationConfig {
    /// Validate and build a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::InvalidFragmentSize`] when
    /// `max_fragment_size` is outside
    /// [`MIN_FRAGMENT_SIZE`]`..=`[`MAX_FRAGMENT_SIZE`], and
    /// [`FragmentationError::BudgetBelowFragmentSize`] when
    /// `max_reassembly_size` is smaller than one fragment.
    pub fn new(
        max_fragment_size: usize,
        max_reassembly_size: usize,
    ) -> Result<Self, FragmentationError> {
        let max_fragment_size = validate_fragment_size(max_fragment_size)?;
        let max_reassembly_size = NonZeroUsize::new(max_reassembly_size)
            .filter(|budget| *budget >= max_fragment_size)
            .ok_or(FragmentationError::BudgetBelowFragmentSize {
                budget: max_reassembly_size,
                fragment_size: max_fragment_size.get(),
            })?;
        Ok(Self {
            max_fragment_size,
            max_reassembly_size,
            reassembly_timeout: DEFAULT_REASSEMBLY_TIMEOUT,
        })
    }

    /// Override the eviction age for incomplete reassembly buffers.
    #[must_use]
    pub const fn with_reassembly_timeout(mut self, timeout: Duration) -> Self {
        self.reassembly_timeout = timeout;
        self
    }

    /// Largest encoded size of a single outbound fragment.
    #[must_use]
    pub const fn max_fragment_size(&self) -> NonZeroUsize { self.max_fragment_size }

    /// Cap on a single stream's reassembled metadata and data.
    #[must_use]
    pub const fn max_reassembly_size(&self) -> NonZeroUsize { self.max_reassembly_size }

    /// Eviction age for incomplete reassembly buffers.
    #[must_use]
    pub const fn reassembly_timeout(&self) -> Duration { self.reassembly_timeout }
}

pub(super) fn validate_fragment_size(size: usize) -> Result<NonZeroUsize, FragmentationError> {
    NonZeroUsize::new(size)
        .filter(|size| (MIN_FRAGMENT_SIZE..=MAX_FRAGMENT_SIZE).contains(&size.get()))
        .ok_or(FragmentationError::InvalidFragmentSize {
            size,
            min: MIN_FRAGMENT_SIZE,
            max: MAX_FRAGMENT_SIZE,
        })
}
