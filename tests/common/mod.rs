//! Shared utilities for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use reframe::{
    FragmentationConfig,
    ResumableSession,
    ResumeToken,
    session::ResumeConfig,
};

/// Boxed error type for integration tests returning `Result`.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Fragmentation limits used across the transport tests.
pub fn fragmentation_config(max_fragment_size: usize) -> TestResult<FragmentationConfig> {
    Ok(FragmentationConfig::new(max_fragment_size, 64 * 1024)?)
}

/// Detached session under `token` with default resume settings.
pub fn session(token: &'static [u8]) -> ResumableSession {
    ResumableSession::new(ResumeToken::from_static(token), &ResumeConfig::default())
}
