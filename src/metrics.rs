//! Metric helpers for `reframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Counter of wire fragments produced by splitting oversized frames.
pub const FRAGMENTS_EMITTED: &str = "reframe_fragments_emitted_total";
/// Counter of logical frames rebuilt from more than one fragment.
pub const FRAMES_REASSEMBLED: &str = "reframe_frames_reassembled_total";
/// Counter of reassembly failures, labelled by `reason`.
pub const REASSEMBLY_FAILURES: &str = "reframe_reassembly_failures_total";
/// Counter of session lifecycle events, labelled by `event`.
pub const SESSION_EVENTS: &str = "reframe_session_events_total";
/// Counter of frames re-sent after a resumption.
pub const FRAMES_REPLAYED: &str = "reframe_frames_replayed_total";

/// Session lifecycle events recorded under [`SESSION_EVENTS`].
#[derive(Clone, Copy, Debug)]
pub enum SessionEvent {
    /// A session was registered with the manager.
    Saved,
    /// A session was replaced by a newer one under the same token.
    Superseded,
    /// A session was resumed on a new connection.
    Resumed,
    /// A session was disposed.
    Disposed,
}

impl SessionEvent {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "metrics disabled"))]
    fn as_str(self) -> &'static str {
        match self {
            SessionEvent::Saved => "saved",
            SessionEvent::Superseded => "superseded",
            SessionEvent::Resumed => "resumed",
            SessionEvent::Disposed => "disposed",
        }
    }
}

/// Record `count` fragments produced for one oversized frame.
pub fn inc_fragments_emitted(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_EMITTED).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a logical frame rebuilt from fragments.
pub fn inc_frames_reassembled() {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_REASSEMBLED).increment(1);
}

/// Record a reassembly failure.
pub fn inc_reassembly_failures(reason: &'static str) {
    #[cfg(feature = "metrics")]
    counter!(REASSEMBLY_FAILURES, "reason" => reason).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a session lifecycle event.
pub fn inc_session_event(event: SessionEvent) {
    #[cfg(feature = "metrics")]
    counter!(SESSION_EVENTS, "event" => event.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = event;
}

/// Record `count` frames replayed onto a new connection.
pub fn inc_frames_replayed(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_REPLAYED).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}
