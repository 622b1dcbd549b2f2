//! Once-only close notification shared by connections and sessions.

use parking_lot::Mutex;

/// Callback run when the observed object closes.
pub type CloseObserver = Box<dyn FnOnce() + Send + 'static>;

/// List of observers fired exactly once when the owner closes.
///
/// Observers registered after closure run immediately on the registering
/// thread. Observers always run without the internal lock held, so they may
/// register further observers or call back into the owner.
#[derive(Default)]
pub struct CloseNotifier {
    state: Mutex<NotifierState>,
}

#[derive(Default)]
struct NotifierState {
    closed: bool,
    observers: Vec<CloseObserver>,
}

impl CloseNotifier {
    /// Create an open notifier with no observers.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `observer`, running it at once if the owner already closed.
    pub fn register(&self, observer: CloseObserver) {
        let mut state = self.state.lock();
        if state.closed {
            drop(state);
            observer();
        } else {
            state.observers.push(observer);
        }
    }

    /// Mark the owner closed and run every registered observer.
    ///
    /// Returns `false` if the notifier had already fired.
    pub fn notify(&self) -> bool {
        let observers = {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
            std::mem::take(&mut state.observers)
        };
        for observer in observers {
            observer();
        }
        true
    }

    /// Whether [`notify`](Self::notify) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.state.lock().closed }
}

impl std::fmt::Debug for CloseNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("CloseNotifier")
            .field("closed", &state.closed)
            .field("observers", &state.observers.len())
            .finish()
    }
}
