//! Resumption settings.

use std::{num::NonZeroUsize, time::Duration};

/// Default byte capacity of a session's unacknowledged frame store.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024 * 1024) {
    Some(capacity) => capacity,
    None => panic!("cache capacity must be non-zero"),
};
/// Default window for a detached session to be resumed before disposal.
pub const DEFAULT_RESUME_TIMEOUT: Duration = Duration::from_secs(120);

/// Settings applied to every resumable session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResumeConfig {
    /// Maximum bytes of sent-but-unacknowledged frames retained for replay.
    pub cache_capacity: NonZeroUsize,
    /// How long a detached session waits for a resume before disposal.
    pub resume_timeout: Duration,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            resume_timeout: DEFAULT_RESUME_TIMEOUT,
        }
    }
}
