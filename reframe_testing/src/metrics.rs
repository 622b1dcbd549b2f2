//! Helpers for asserting on metrics recorded through `metrics-util`.
//!
//! Taking a [`Snapshotter`] snapshot drains the recorded counters, so capture
//! one [`Counters`] per test and query it as often as needed.

use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};

/// Create a debugging recorder and the snapshotter that reads it.
#[must_use]
pub fn debugging_recorder() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

/// Counter readings captured from a single snapshot.
#[derive(Debug)]
pub struct Counters(Vec<(CompositeKey, u64)>);

impl Counters {
    /// Drain `snapshotter` once and keep every counter it reported.
    #[must_use]
    pub fn capture(snapshotter: &Snapshotter) -> Self {
        Self(
            snapshotter
                .snapshot()
                .into_vec()
                .into_iter()
                .filter_map(|(key, _, _, value)| match value {
                    DebugValue::Counter(count) => Some((key, count)),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Sum of counter `name` across series, optionally filtered to those
    /// carrying the label `key=value`.
    #[must_use]
    pub fn value(&self, name: &str, label: Option<(&str, &str)>) -> u64 {
        self.0
            .iter()
            .filter(|(key, _)| key.key().name() == name)
            .filter(|(key, _)| {
                label.is_none_or(|(k, v)| {
                    key.key()
                        .labels()
                        .any(|l| l.key() == k && l.value() == v)
                })
            })
            .map(|(_, count)| count)
            .sum()
    }
}
