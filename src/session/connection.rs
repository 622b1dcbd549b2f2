//! Transport connection abstraction consumed by resumable sessions.
//!
//! A [`DuplexConnection`] hands encoded frames to the transport without
//! blocking and reports its closure through registered observers.
//! [`ChannelConnection`] is the in-process implementation: frames are queued
//! on an unbounded channel drained by the transport's writer task.

use std::sync::Arc;

use bytes::Bytes;
use derive_more::{Display, From, Into};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{CloseNotifier, CloseObserver};

/// Identifier assigned to a transport connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, From, Into)]
#[display("ConnectionId({_0})")]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new [`ConnectionId`] with the provided value.
    #[must_use]
    pub const fn new(id: u64) -> Self { Self(id) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(&self) -> u64 { self.0 }
}

/// Errors reported by [`DuplexConnection::send`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection is closed or its writer has gone away.
    #[error("{id} is closed")]
    Closed { id: ConnectionId },
}

/// Byte-oriented duplex transport connection.
///
/// Implementations must not block in [`send`](Self::send) and must not run
/// close observers from inside `send`; sessions call it while holding their
/// state lock.
pub trait DuplexConnection: Send + Sync + 'static {
    /// Identifier of this connection.
    fn id(&self) -> ConnectionId;

    /// Queue one encoded frame for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Closed`] once the connection can no longer
    /// carry frames.
    fn send(&self, frame: Bytes) -> Result<(), ConnectionError>;

    /// Close the connection. Idempotent.
    fn close(&self);

    /// Register an observer run exactly once when the connection closes.
    fn on_close(&self, observer: CloseObserver);

    /// Whether the connection has closed.
    fn is_closed(&self) -> bool;
}

/// Connection backed by an unbounded channel to a writer task.
#[derive(Debug)]
pub struct ChannelConnection {
    id: ConnectionId,
    frames: mpsc::UnboundedSender<Bytes>,
    closed: CloseNotifier,
    shutdown: CancellationToken,
}

impl ChannelConnection {
    /// Create a connection and the receiver its writer task drains.
    #[must_use]
    pub fn new(id: ConnectionId) -> (Arc<Self>, mpsc::UnboundedReceiver<Bytes>) {
        let (frames, rx) = mpsc::unbounded_channel();
        let connection = Arc::new(Self {
            id,
            frames,
            closed: CloseNotifier::new(),
            shutdown: CancellationToken::new(),
        });
        (connection, rx)
    }

    /// Resolve once the connection has been closed.
    pub async fn closed(&self) { self.shutdown.cancelled().await; }
}

impl DuplexConnection for ChannelConnection {
    fn id(&self) -> ConnectionId { self.id }

    fn send(&self, frame: Bytes) -> Result<(), ConnectionError> {
        if self.shutdown.is_cancelled() {
            return Err(ConnectionError::Closed { id: self.id });
        }
        self.frames
            .send(frame)
            .map_err(|_| ConnectionError::Closed { id: self.id })
    }

    fn close(&self) {
        self.shutdown.cancel();
        if self.closed.notify() {
            log::debug!("connection closed: id={}", self.id);
        }
    }

    fn on_close(&self, observer: CloseObserver) { self.closed.register(observer); }

    fn is_closed(&self) -> bool { self.shutdown.is_cancelled() }
}
