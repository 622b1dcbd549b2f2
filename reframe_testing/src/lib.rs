//! Shared fixtures for `reframe` integration tests.
//!
//! Provides frame builders with recognisable byte patterns, a serialised
//! handle to the global `logtest` logger, and helpers for reading counters
//! out of a `metrics-util` debugging recorder.

pub mod frames;
pub mod logging;
pub mod metrics;

pub use frames::{encoded_payload, patterned, request};
pub use logging::{LoggerHandle, logger};
pub use metrics::{Counters, debugging_recorder};
