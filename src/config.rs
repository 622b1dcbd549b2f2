//! Reliability layer configuration.
//!
//! [`ReliabilitySettings`] is the plain, deserialisable form read from
//! configuration files and environment variables. Converting it into a
//! [`ReliabilityConfig`] validates every value.

use std::{num::NonZeroUsize, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    fragment::{
        DEFAULT_MAX_REASSEMBLY_SIZE,
        DEFAULT_REASSEMBLY_TIMEOUT,
        FragmentationConfig,
        FragmentationError,
    },
    session::{DEFAULT_CACHE_CAPACITY, DEFAULT_RESUME_TIMEOUT, ResumeConfig},
};

/// Default fragment size used when none is configured.
pub const DEFAULT_MAX_FRAGMENT_SIZE: usize = 16 * 1024;

/// Errors raised while validating [`ReliabilitySettings`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The fragmentation settings are inconsistent.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// A size that must be positive was zero.
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {variable}")]
    InvalidOverride { variable: &'static str, value: String },
}

/// Validated configuration for fragmentation and resumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReliabilityConfig {
    pub fragmentation: FragmentationConfig,
    pub resume: ResumeConfig,
}

/// Unvalidated settings in plain units.
///
/// Missing fields take their defaults.
///
/// # Examples
///
/// ```
/// use reframe::config::{ReliabilityConfig, ReliabilitySettings};
/// let settings = ReliabilitySettings {
///     max_fragment_size: 1024,
///     ..ReliabilitySettings::default()
/// };
/// let config = ReliabilityConfig::try_from(settings).expect("valid settings");
/// assert_eq!(config.fragmentation.max_fragment_size().get(), 1024);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilitySettings {
    /// Largest encoded fragment in bytes.
    pub max_fragment_size: usize,
    /// Largest logical frame a peer may reassemble, in bytes.
    pub max_reassembly_size: usize,
    /// Milliseconds before a partial frame is evicted.
    pub reassembly_timeout_ms: u64,
    /// Bytes of unacknowledged frames retained per session.
    pub resume_cache_capacity: usize,
    /// Milliseconds a detached session waits for a resume.
    pub resume_timeout_ms: u64,
}

impl Default for ReliabilitySettings {
    fn default() -> Self {
        Self {
            max_fragment_size: DEFAULT_MAX_FRAGMENT_SIZE,
            max_reassembly_size: DEFAULT_MAX_REASSEMBLY_SIZE,
            reassembly_timeout_ms: duration_ms(DEFAULT_REASSEMBLY_TIMEOUT),
            resume_cache_capacity: DEFAULT_CACHE_CAPACITY.get(),
            resume_timeout_ms: duration_ms(DEFAULT_RESUME_TIMEOUT),
        }
    }
}

impl ReliabilitySettings {
    /// Apply `REFRAME_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for values that do not parse.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|variable| std::env::var(variable).ok())
    }

    /// Apply overrides resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for values that do not parse.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        override_with(&lookup, "REFRAME_MAX_FRAGMENT_SIZE", &mut self.max_fragment_size)?;
        override_with(&lookup, "REFRAME_MAX_REASSEMBLY_SIZE", &mut self.max_reassembly_size)?;
        override_with(&lookup, "REFRAME_REASSEMBLY_TIMEOUT_MS", &mut self.reassembly_timeout_ms)?;
        override_with(&lookup, "REFRAME_RESUME_CACHE_CAPACITY", &mut self.resume_cache_capacity)?;
        override_with(&lookup, "REFRAME_RESUME_TIMEOUT_MS", &mut self.resume_timeout_ms)?;
        Ok(())
    }
}

impl TryFrom<ReliabilitySettings> for ReliabilityConfig {
    type Error = ConfigError;

    fn try_from(settings: ReliabilitySettings) -> Result<Self, Self::Error> {
        let cache_capacity = NonZeroUsize::new(settings.resume_cache_capacity).ok_or(
            ConfigError::Zero {
                field: "resume_cache_capacity",
            },
        )?;
        let fragmentation =
            FragmentationConfig::new(settings.max_fragment_size, settings.max_reassembly_size)?
                .with_reassembly_timeout(Duration::from_millis(settings.reassembly_timeout_ms));
        Ok(Self {
            fragmentation,
            resume: ResumeConfig {
                cache_capacity,
                resume_timeout: Duration::from_millis(settings.resume_timeout_ms),
            },
        })
    }
}

fn override_with<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
    target: &mut T,
) -> Result<(), ConfigError> {
    let Some(value) = lookup(variable) else {
        return Ok(());
    };
    *target = value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride { variable, value })?;
    Ok(())
}

fn duration_ms(duration: Duration) -> u64 { u64::try_from(duration.as_millis()).unwrap_or(u64::MAX) }
