//! Connection resumption.
//!
//! A [`ResumableSession`] keeps the frames a peer has not acknowledged so that
//! a logical session survives the loss of its transport connection. The
//! [`SessionManager`] maps resume tokens to sessions and resolves reconnecting
//! transports to the session they belong to.

mod close;
mod config;
mod connection;
mod error;
mod manager;
mod position;
mod resumable;
mod store;
mod token;

pub use close::{CloseNotifier, CloseObserver};
pub use config::{DEFAULT_CACHE_CAPACITY, DEFAULT_RESUME_TIMEOUT, ResumeConfig};
pub use connection::{ChannelConnection, ConnectionError, ConnectionId, DuplexConnection};
pub use error::SessionError;
pub use manager::SessionManager;
pub use position::ResumePosition;
pub use resumable::{ResumableSession, SessionId};
pub use store::FrameStore;
pub use token::ResumeToken;

#[cfg(test)]
mod tests;
