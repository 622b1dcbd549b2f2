//! Process-wide registry of resumable sessions keyed by resume token.
//!
//! The table is a sharded [`DashMap`], so saves and lookups for one token are
//! serialised by that token's shard lock while different tokens proceed in
//! parallel. Sessions are never disposed while a shard lock is held: dispose
//! runs close observers, and the observer installed by
//! [`SessionManager::save`] removes its own entry from the table.

use std::sync::{
    Arc,
    Weak,
    atomic::{AtomicBool, Ordering},
};

use dashmap::DashMap;
use tracing::{debug, info};

use super::{
    DuplexConnection,
    ResumableSession,
    ResumePosition,
    ResumeToken,
    SessionError,
    SessionId,
};
use crate::metrics::{self, SessionEvent};

#[derive(Default)]
struct ManagerInner {
    disposed: AtomicBool,
    sessions: DashMap<ResumeToken, ResumableSession>,
}

impl ManagerInner {
    /// Remove the entry for `token` only if it still maps to session `id`.
    fn remove_if_current(&self, token: &ResumeToken, id: SessionId) -> bool {
        self.sessions
            .remove_if(token.as_bytes(), |_, current| current.id() == id)
            .is_some()
    }
}

/// Registry guaranteeing at most one live session per resume token.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct SessionManager {
    inner: Arc<ManagerInner>,
}

impl SessionManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `session` under its token and return it.
    ///
    /// A previous session under the same token is superseded and disposed.
    /// The entry is removed when `session` is disposed, unless a newer
    /// session has replaced it by then. If the manager is already disposed,
    /// `session` is disposed immediately instead. A session that is already
    /// disposed is never registered.
    pub fn save(&self, session: ResumableSession) -> ResumableSession {
        if self.is_disposed() {
            debug!(session = %session.id(), "manager disposed; rejecting session");
            session.dispose();
            return session;
        }

        if session.is_disposed() {
            debug!(session = %session.id(), "session already disposed; not saved");
            return session;
        }

        let previous = self
            .inner
            .sessions
            .insert(session.token().clone(), session.clone());
        info!(session = %session.id(), token = %session.token(), "session saved");
        metrics::inc_session_event(SessionEvent::Saved);

        // Registered after the insert: a session disposed in between runs
        // the observer at once, which evicts the entry just made.
        let manager: Weak<ManagerInner> = Arc::downgrade(&self.inner);
        let (token, id) = (session.token().clone(), session.id());
        session.on_close(move || {
            if let Some(manager) = manager.upgrade()
                && manager.remove_if_current(&token, id)
            {
                debug!(session = %id, %token, "session removed");
            }
        });

        if let Some(previous) = previous.filter(|previous| previous.id() != session.id()) {
            info!(
                session = %previous.id(),
                replacement = %session.id(),
                token = %previous.token(),
                "session superseded"
            );
            metrics::inc_session_event(SessionEvent::Superseded);
            previous.dispose();
        }

        // A dispose() that swapped the flag before our insert became visible
        // may have missed the entry; clean it up here.
        if self.inner.disposed.load(Ordering::SeqCst) {
            self.inner.remove_if_current(session.token(), session.id());
            session.dispose();
        }
        session
    }

    /// Look up the session registered under `token`.
    #[must_use]
    pub fn get(&self, token: &[u8]) -> Option<ResumableSession> {
        self.inner
            .sessions
            .get(token)
            .map(|entry| entry.value().clone())
    }

    /// Resume the session registered under `token` on `connection`.
    ///
    /// Returns the session and the number of frames replayed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownToken`] if no session is registered,
    /// or any error of [`ResumableSession::resume`].
    pub fn resume(
        &self,
        token: &[u8],
        connection: Arc<dyn DuplexConnection>,
        peer_position: ResumePosition,
    ) -> Result<(ResumableSession, u64), SessionError> {
        let Some(session) = self.get(token) else {
            return Err(SessionError::UnknownToken {
                token: ResumeToken::new(token.to_vec()),
            });
        };
        let replayed = session.resume(connection, peer_position)?;
        Ok((session, replayed))
    }

    /// Dispose the manager and every registered session.
    ///
    /// Later saves dispose their session immediately. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        let tokens: Vec<_> = self
            .inner
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        let sessions: Vec<ResumableSession> = tokens
            .iter()
            .filter_map(|token| self.inner.sessions.remove(token).map(|(_, session)| session))
            .collect();
        info!(sessions = sessions.len(), "session manager disposed");
        for session in sessions {
            session.dispose();
        }
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool { self.inner.disposed.load(Ordering::SeqCst) }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize { self.inner.sessions.len() }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.inner.sessions.is_empty() }

    /// Identity of the session registered under `token`, if any.
    #[must_use]
    pub fn session_id(&self, token: &[u8]) -> Option<SessionId> {
        self.inner.sessions.get(token).map(|entry| entry.id())
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
