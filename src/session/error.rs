//! Error types for resumable sessions.

use thiserror::Error;

use super::{ResumePosition, ResumeToken};
use crate::frame::MalformedFrame;

/// Errors returned by [`ResumableSession`](super::ResumableSession) and
/// [`SessionManager`](super::SessionManager).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session was disposed; the offered connection should be closed.
    #[error("session is disposed")]
    Disposed,
    /// The operation needs an attached connection.
    #[error("session has no attached connection")]
    NotAttached,
    /// The requested position has been evicted or lies beyond the last sent
    /// frame, so the session cannot be resumed from it.
    #[error(
        "resume position {requested} unavailable: retained range is \
         {first_available}..={last_sent}"
    )]
    PositionUnavailable {
        requested: ResumePosition,
        first_available: ResumePosition,
        last_sent: ResumePosition,
    },
    /// The peer acknowledged more than was ever sent.
    #[error("acknowledged position {position} is beyond last sent position {last_sent}")]
    PositionOutOfRange {
        position: ResumePosition,
        last_sent: ResumePosition,
    },
    /// No session is registered under the token.
    #[error("no session registered for resume token {token}")]
    UnknownToken { token: ResumeToken },
    /// A frame handed to the session could not be parsed.
    #[error(transparent)]
    Malformed(#[from] MalformedFrame),
}
