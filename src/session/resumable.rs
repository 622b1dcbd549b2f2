//! A logical session that outlives its transport connections.
//!
//! [`ResumableSession`] owns at most one attached [`DuplexConnection`] and a
//! [`FrameStore`] of resumable frames the peer has not acknowledged yet. When
//! the transport drops the session detaches and waits; a new connection can
//! then [`resume`](ResumableSession::resume) it, receiving every frame after
//! the peer's last received position before any new frame.
//!
//! Disposal is a one-way latch. Every mutating operation checks it under the
//! session lock, so disposal may race freely with sends, acks and attaches
//! from other threads. Connections are always closed, and close observers
//! always run, after the session lock has been released.

use std::{
    sync::{
        Arc,
        Weak,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use bytes::Bytes;
use derive_more::Display;
use parking_lot::Mutex;
use tracing::{debug, info};

use super::{
    CloseNotifier,
    ConnectionId,
    DuplexConnection,
    FrameStore,
    ResumeConfig,
    ResumePosition,
    ResumeToken,
    SessionError,
};
use crate::{
    frame::FrameHeader,
    metrics::{self, SessionEvent},
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`ResumableSession`] instance.
///
/// Two sessions created with the same token still have distinct ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[display("SessionId({_0})")]
pub struct SessionId(u64);

impl SessionId {
    fn next() -> Self { Self(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)) }

    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(&self) -> u64 { self.0 }
}

struct SessionInner {
    id: SessionId,
    token: ResumeToken,
    resume_timeout: Duration,
    disposed: AtomicBool,
    state: Mutex<SessionState>,
    closed: CloseNotifier,
}

struct SessionState {
    connection: Option<Arc<dyn DuplexConnection>>,
    // Bumped on every attach so a resume deadline can tell whether the
    // session was re-attached while it slept.
    generation: u64,
    store: FrameStore,
    implied_position: ResumePosition,
}

impl SessionState {
    /// Install `connection`, returning the superseded one if it is a
    /// different connection.
    fn install(
        &mut self,
        connection: Arc<dyn DuplexConnection>,
    ) -> Option<Arc<dyn DuplexConnection>> {
        self.generation += 1;
        self.connection
            .replace(Arc::clone(&connection))
            .filter(|previous| !Arc::ptr_eq(previous, &connection))
    }

    fn replay(&self, position: ResumePosition) -> Result<u64, SessionError> {
        let Some(connection) = self.connection.as_ref() else {
            return Err(SessionError::NotAttached);
        };
        let mut replayed = 0;
        for frame in self.store.frames_after(position)? {
            if let Err(e) = connection.send(frame.clone()) {
                debug!(error = %e, replayed, "replay interrupted");
                break;
            }
            replayed += 1;
        }
        Ok(replayed)
    }
}

/// Handle to a resumable session. Clones share the same session.
#[derive(Clone)]
pub struct ResumableSession {
    inner: Arc<SessionInner>,
}

impl ResumableSession {
    /// Create a detached session identified by `token`.
    #[must_use]
    pub fn new(token: ResumeToken, config: &ResumeConfig) -> Self {
        let id = SessionId::next();
        debug!(session = %id, %token, "session created");
        Self {
            inner: Arc::new(SessionInner {
                id,
                token,
                resume_timeout: config.resume_timeout,
                disposed: AtomicBool::new(false),
                state: Mutex::new(SessionState {
                    connection: None,
                    generation: 0,
                    store: FrameStore::new(config.cache_capacity),
                    implied_position: ResumePosition::ZERO,
                }),
                closed: CloseNotifier::new(),
            }),
        }
    }

    /// Identity of this session instance.
    #[must_use]
    pub fn id(&self) -> SessionId { self.inner.id }

    /// Token the session is registered under.
    #[must_use]
    pub fn token(&self) -> &ResumeToken { &self.inner.token }

    /// Whether the session has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool { self.inner.disposed.load(Ordering::Acquire) }

    /// Whether a connection is currently attached.
    #[must_use]
    pub fn is_attached(&self) -> bool { self.inner.state.lock().connection.is_some() }

    /// Identifier of the attached connection, if any.
    #[must_use]
    pub fn connection_id(&self) -> Option<ConnectionId> {
        self.inner
            .state
            .lock()
            .connection
            .as_ref()
            .map(|connection| connection.id())
    }

    /// Install `connection` as the active transport.
    ///
    /// A different previously attached connection is superseded and closed.
    /// When `connection` later closes, the session detaches from it but stays
    /// resumable.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disposed`] if the session has been disposed;
    /// the caller should close the offered connection.
    pub fn attach(&self, connection: Arc<dyn DuplexConnection>) -> Result<(), SessionError> {
        let previous = {
            let mut state = self.inner.state.lock();
            if self.is_disposed() {
                return Err(SessionError::Disposed);
            }
            state.install(Arc::clone(&connection))
        };
        debug!(session = %self.id(), connection = %connection.id(), "connection attached");
        self.finish_attach(&connection, previous);
        Ok(())
    }

    /// Clear the active connection without closing it or disposing the
    /// session.
    pub fn detach(&self) -> Option<Arc<dyn DuplexConnection>> {
        let previous = self.inner.state.lock().connection.take();
        if let Some(connection) = &previous {
            debug!(session = %self.id(), connection = %connection.id(), "connection detached");
        }
        previous
    }

    /// Record `frame` if resumable and forward it to the attached connection.
    ///
    /// Frames sent while detached are only recorded, to be replayed by the
    /// next [`resume`](Self::resume). Returns the position after the frame,
    /// or `None` for connection-level frames which are never retained.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disposed`] after disposal and
    /// [`SessionError::Malformed`] if the frame header cannot be parsed.
    pub fn send(&self, frame: Bytes) -> Result<Option<ResumePosition>, SessionError> {
        let header = FrameHeader::parse(&frame)?;
        let mut state = self.inner.state.lock();
        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        let position = header
            .is_resumable()
            .then(|| state.store.push(frame.clone()));
        if let Some(connection) = state.connection.as_ref()
            && let Err(e) = connection.send(frame)
        {
            debug!(session = %self.id(), error = %e, "send on closing connection");
        }
        Ok(position)
    }

    /// Record an already transmitted frame for potential replay.
    ///
    /// Connection-level frames are not retained and leave the position
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disposed`] after disposal and
    /// [`SessionError::Malformed`] if the frame header cannot be parsed.
    pub fn record_sent(&self, frame: Bytes) -> Result<ResumePosition, SessionError> {
        let header = FrameHeader::parse(&frame)?;
        let mut state = self.inner.state.lock();
        if self.is_disposed() {
            return Err(SessionError::Disposed);
        }
        Ok(if header.is_resumable() {
            state.store.push(frame)
        } else {
            state.store.position()
        })
    }

    /// Release every frame the peer acknowledged up to `position`.
    ///
    /// Acknowledgements on a disposed session are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PositionOutOfRange`] when `position` is beyond
    /// the last sent frame.
    pub fn on_ack(&self, position: ResumePosition) -> Result<(), SessionError> {
        let mut state = self.inner.state.lock();
        if self.is_disposed() {
            return Ok(());
        }
        state.store.release_through(position)?;
        Ok(())
    }

    /// Re-send every retained frame after `position`, oldest first, over the
    /// attached connection. Returns the number of frames re-sent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disposed`], [`SessionError::NotAttached`], or
    /// [`SessionError::PositionUnavailable`] when `position` is outside the
    /// retained range.
    pub fn replay_from(&self, position: ResumePosition) -> Result<u64, SessionError> {
        let replayed = {
            let state = self.inner.state.lock();
            if self.is_disposed() {
                return Err(SessionError::Disposed);
            }
            state.replay(position)?
        };
        metrics::inc_frames_replayed(replayed);
        Ok(replayed)
    }

    /// Attach `connection`, release frames through `peer_position`, and
    /// replay the rest in one step so that no new frame can overtake the
    /// replay.
    ///
    /// Returns the number of frames replayed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Disposed`] or
    /// [`SessionError::PositionUnavailable`]; the session is left untouched
    /// and the caller should reject the resume and close `connection`.
    pub fn resume(
        &self,
        connection: Arc<dyn DuplexConnection>,
        peer_position: ResumePosition,
    ) -> Result<u64, SessionError> {
        let (previous, replayed) = {
            let mut state = self.inner.state.lock();
            if self.is_disposed() {
                return Err(SessionError::Disposed);
            }
            state.store.check_available(peer_position)?;
            state.store.release_through(peer_position)?;
            let previous = state.install(Arc::clone(&connection));
            (previous, state.replay(peer_position)?)
        };
        info!(
            session = %self.id(),
            connection = %connection.id(),
            %peer_position,
            replayed,
            "session resumed"
        );
        metrics::inc_session_event(SessionEvent::Resumed);
        metrics::inc_frames_replayed(replayed);
        self.finish_attach(&connection, previous);
        Ok(replayed)
    }

    /// Advance the implied position past a received frame.
    ///
    /// Connection-level frames do not count towards the position.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Malformed`] if the frame header cannot be
    /// parsed.
    pub fn record_received(&self, frame: &[u8]) -> Result<ResumePosition, SessionError> {
        let header = FrameHeader::parse(frame)?;
        let mut state = self.inner.state.lock();
        if header.is_resumable() {
            state.implied_position = state.implied_position.advance(frame.len());
        }
        Ok(state.implied_position)
    }

    /// Position up to which resumable frames have been received.
    #[must_use]
    pub fn implied_position(&self) -> ResumePosition { self.inner.state.lock().implied_position }

    /// Position after the last resumable frame sent.
    #[must_use]
    pub fn sent_position(&self) -> ResumePosition { self.inner.state.lock().store.position() }

    /// Earliest position the session can still be resumed from.
    #[must_use]
    pub fn first_available_position(&self) -> ResumePosition {
        self.inner.state.lock().store.first_available()
    }

    /// Number of retained, unacknowledged frames.
    #[must_use]
    pub fn unacked_len(&self) -> usize { self.inner.state.lock().store.len() }

    /// Register `observer` to run once when the session is disposed, or at
    /// once if it already has been.
    pub fn on_close(&self, observer: impl FnOnce() + Send + 'static) {
        self.inner.closed.register(Box::new(observer));
    }

    /// Configured window for a detached session to be resumed.
    #[must_use]
    pub fn resume_timeout(&self) -> Duration { self.inner.resume_timeout }

    /// Future that disposes the session if it is still detached, and has not
    /// been re-attached since this call, once the configured resume timeout
    /// elapses.
    ///
    /// Resolves to whether it disposed the session.
    pub fn resume_deadline(&self) -> impl Future<Output = bool> + Send + use<> {
        self.resume_deadline_after(self.inner.resume_timeout)
    }

    /// Like [`resume_deadline`](Self::resume_deadline) with an explicit
    /// `timeout`.
    pub fn resume_deadline_after(
        &self,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send + use<> {
        let generation = self.inner.state.lock().generation;
        let session = Arc::downgrade(&self.inner);
        let expires_at = tokio::time::Instant::now() + timeout;
        async move {
            tokio::time::sleep_until(expires_at).await;
            let Some(inner) = session.upgrade() else {
                return false;
            };
            let session = ResumableSession { inner };
            let expired = session.dispose_when(|state| {
                state.connection.is_none() && state.generation == generation
            });
            if expired {
                info!(session = %session.id(), ?timeout, "resume window expired");
            }
            expired
        }
    }

    /// Dispose the session: drop retained frames, close the attached
    /// connection and notify close observers. Idempotent and safe to call
    /// from any thread.
    pub fn dispose(&self) { self.dispose_when(|_| true); }

    /// Whether `self` and `other` are handles to the same session.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }

    fn dispose_when(&self, condition: impl FnOnce(&SessionState) -> bool) -> bool {
        let connection = {
            let mut state = self.inner.state.lock();
            if self.is_disposed() || !condition(&state) {
                return false;
            }
            self.inner.disposed.store(true, Ordering::Release);
            state.store.clear();
            state.connection.take()
        };
        if let Some(connection) = connection {
            connection.close();
        }
        info!(session = %self.id(), token = %self.token(), "session disposed");
        metrics::inc_session_event(SessionEvent::Disposed);
        self.inner.closed.notify();
        true
    }

    fn finish_attach(
        &self,
        connection: &Arc<dyn DuplexConnection>,
        previous: Option<Arc<dyn DuplexConnection>>,
    ) {
        if let Some(previous) = previous {
            debug!(session = %self.id(), connection = %previous.id(), "connection superseded");
            previous.close();
        }
        let session: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let closed: Weak<dyn DuplexConnection> = Arc::downgrade(connection);
        connection.on_close(Box::new(move || {
            if let Some(inner) = session.upgrade() {
                ResumableSession { inner }.detach_if(&closed);
            }
        }));
    }

    fn detach_if(&self, closed: &Weak<dyn DuplexConnection>) {
        let mut state = self.inner.state.lock();
        let Some(current) = state
            .connection
            .take_if(|current| Weak::ptr_eq(&Arc::downgrade(current), closed))
        else {
            return;
        };
        drop(state);
        debug!(
            session = %self.id(),
            connection = %current.id(),
            "connection closed; session detached"
        );
    }
}

impl std::fmt::Debug for ResumableSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumableSession")
            .field("id", &self.inner.id)
            .field("token", &self.inner.token)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
